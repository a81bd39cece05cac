//! Interactive REPL for insula
//!
//! Provides the main user interaction loop with live streaming output.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;

use crate::agent::{Agent, RunEvent};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            agent: Agent::from_config(config),
        }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match input {
                "exit" | "quit" => {
                    println!("\nGoodbye!");
                    break;
                }
                "clear" => {
                    self.agent.reset_memory();
                    println!("Conversation cleared.\n");
                    continue;
                }
                "status" => {
                    self.print_status();
                    continue;
                }
                "help" => {
                    println!("Commands: help, clear, status, exit\n");
                    continue;
                }
                _ => {}
            }

            if let Err(e) = self.process(input).await {
                eprintln!("\nError: {}\n", e);
            }
        }

        Ok(())
    }

    /// Run one query, streaming progress to the terminal
    async fn process(&mut self, input: &str) -> Result<()> {
        let streaming = self.agent.config().streaming.enabled;
        let capacity = self.agent.config().streaming.channel_capacity;

        if !streaming {
            let result = self.agent.run(input).await?;
            println!("\nAssistant:\n{}\n", result.response);
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(capacity);

        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    RunEvent::Status(msg) => eprintln!("[{}]", msg),
                    RunEvent::Delta(delta) => {
                        print!("{}", delta);
                        let _ = io::stdout().flush();
                    }
                    RunEvent::Section { tag, content } => {
                        println!("\n=== {} ===", tag);
                        println!("{}", content);
                        println!("{}\n", "=".repeat(tag.len() + 8));
                    }
                    RunEvent::ToolResult { tool_name, success } => {
                        let status = if success { "ok" } else { "failed" };
                        eprintln!("[tool {} {}]", tool_name, status);
                    }
                }
            }
        });

        let result = self.agent.run_with_events(input, tx).await;
        let _ = printer.await;

        let result = result?;
        println!(
            "\n[done: {} round(s), {} section(s)]\n",
            result.rounds,
            result.sections.len()
        );
        Ok(())
    }

    fn print_status(&self) {
        let config = self.agent.config();
        println!("Gateway:   {}", config.gateway.base_url);
        println!("Model:     {}", config.gateway.model);
        println!("Sandbox:   {}", if config.sandbox.enabled { "enabled" } else { "disabled" });
        println!("Messages:  {}", self.agent.memory_len());
        println!("Sections:  {}\n", config.agent.section_tags.join(", "));
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();

        println!("insula - streaming calculation assistant runtime");
        println!("Gateway: {} ({})", config.gateway.base_url, config.gateway.model);
        println!("Commands: help, clear, status, exit");
        println!("{}", "-".repeat(60));
    }
}

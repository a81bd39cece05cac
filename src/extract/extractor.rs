//! Incremental tagged-section extractor
//!
//! Consumes a model response as a sequence of arbitrary text deltas and
//! recognizes `<tag>...</tag>` spans from a fixed tag registry, even when a
//! tag is split across delta boundaries. At most one section is open at a
//! time; sections do not nest.

/// An event produced by one call to [`SectionExtractor::feed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorEvent {
    /// A complete tagged section was recognized; content is trimmed of
    /// surrounding whitespace
    Section { tag: String, content: String },
    /// The raw delta, emitted exactly once per feed regardless of section
    /// state, enabling low-latency passthrough streaming
    Progress { delta: String },
}

/// Incremental extractor over a fixed registry of section tags
///
/// The tag set is part of the agent configuration and is not discovered
/// dynamically.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    /// Known tag names
    tags: Vec<String>,
    /// Carried text: everything fed so far minus excised section spans
    buffer: String,
    /// Tag of the currently open section, if any
    open: Option<String>,
}

impl SectionExtractor {
    /// Create an extractor recognizing the given tag names
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            buffer: String::new(),
            open: None,
        }
    }

    /// Tag of the currently open section, if any
    pub fn open_section(&self) -> Option<&str> {
        self.open.as_deref()
    }

    /// Append a delta and return the events it produced
    ///
    /// Zero or more `Section` events (in the order the sections closed)
    /// followed by exactly one `Progress` event carrying the raw delta.
    pub fn feed(&mut self, delta: &str) -> Vec<ExtractorEvent> {
        self.buffer.push_str(delta);

        let mut events = Vec::new();
        loop {
            if self.open.is_none() {
                self.open = self.find_opening_tag();
            }

            let Some(tag) = self.open.clone() else {
                break;
            };

            if !self.try_close(&tag, &mut events) {
                break;
            }
        }

        events.push(ExtractorEvent::Progress {
            delta: delta.to_string(),
        });
        events
    }

    /// Scan for the earliest start tag in the buffer.
    ///
    /// A start tag only opens a section if its exact text occurs exactly once
    /// in the buffer so far. This guards against opening on tag text quoted
    /// inside unrelated content before the real opening, at the cost of never
    /// opening a tag whose literal text was echoed earlier.
    fn find_opening_tag(&self) -> Option<String> {
        let mut found: Option<(usize, &str)> = None;

        for tag in &self.tags {
            let start = format!("<{}>", tag);
            if let Some(pos) = self.buffer.find(&start) {
                if self.buffer.rfind(&start) == Some(pos)
                    && found.map_or(true, |(best, _)| pos < best)
                {
                    found = Some((pos, tag));
                }
            }
        }

        found.map(|(_, tag)| tag.to_string())
    }

    /// If the open section's end tag has arrived, emit the section and excise
    /// the whole span from the buffer. Returns false when more input is
    /// needed.
    ///
    /// The first occurrence of the end tag after the opening closes the
    /// section. If the end tag text appears inside the section's own content
    /// the section closes early; only well-formed model output round-trips
    /// exactly.
    fn try_close(&mut self, tag: &str, events: &mut Vec<ExtractorEvent>) -> bool {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);

        let Some(start_pos) = self.buffer.find(&start_tag) else {
            // Span was consumed by a previous iteration; nothing left to close.
            self.open = None;
            return false;
        };

        let body_start = start_pos + start_tag.len();
        match self.buffer[body_start..].find(&end_tag) {
            Some(rel) => {
                let end_pos = body_start + rel;
                let content = self.buffer[body_start..end_pos].trim().to_string();

                events.push(ExtractorEvent::Section {
                    tag: tag.to_string(),
                    content,
                });

                // Remove the tagged span so it cannot re-match.
                self.buffer
                    .replace_range(start_pos..end_pos + end_tag.len(), "");
                self.open = None;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SectionExtractor {
        SectionExtractor::new([
            "calculation_plan",
            "parameters_provided",
            "parameters_required",
            "assumptions",
        ])
    }

    fn sections(events: &[ExtractorEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                ExtractorEvent::Section { tag, content } => {
                    Some((tag.clone(), content.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_section_in_single_delta() {
        let mut ex = extractor();
        let events = ex.feed("<assumptions>A=1\nB=2</assumptions>");
        assert_eq!(
            sections(&events),
            vec![("assumptions".to_string(), "A=1\nB=2".to_string())]
        );
    }

    #[test]
    fn test_section_split_across_deltas() {
        let mut ex = extractor();
        let events = ex.feed("<assumptions>A=1");
        assert!(sections(&events).is_empty());
        assert_eq!(ex.open_section(), Some("assumptions"));

        let events = ex.feed("\nB=2</assumptions>");
        assert_eq!(
            sections(&events),
            vec![("assumptions".to_string(), "A=1\nB=2".to_string())]
        );
        assert_eq!(ex.open_section(), None);
    }

    #[test]
    fn test_tag_split_mid_name() {
        let mut ex = extractor();
        ex.feed("<calc");
        ex.feed("ulation_plan>step 1: compute U");
        assert_eq!(ex.open_section(), Some("calculation_plan"));

        let events = ex.feed("</calculation_pl");
        assert!(sections(&events).is_empty());

        let events = ex.feed("an>");
        assert_eq!(
            sections(&events),
            vec![(
                "calculation_plan".to_string(),
                "step 1: compute U".to_string()
            )]
        );
    }

    #[test]
    fn test_two_sections_in_one_delta() {
        let mut ex = extractor();
        let events = ex.feed(
            "<calculation_plan>step 1: compute U\n</calculation_plan>\
             <parameters_provided>T=40</parameters_provided>",
        );
        assert_eq!(
            sections(&events),
            vec![
                (
                    "calculation_plan".to_string(),
                    "step 1: compute U".to_string()
                ),
                ("parameters_provided".to_string(), "T=40".to_string()),
            ]
        );
    }

    #[test]
    fn test_byte_by_byte_feeding() {
        let text = "intro <assumptions>\n A=1 \n</assumptions> outro";
        let mut ex = extractor();
        let mut all_sections = Vec::new();
        let mut progress = String::new();

        for ch in text.chars() {
            for event in ex.feed(&ch.to_string()) {
                match event {
                    ExtractorEvent::Section { tag, content } => {
                        all_sections.push((tag, content));
                    }
                    ExtractorEvent::Progress { delta } => progress.push_str(&delta),
                }
            }
        }

        assert_eq!(
            all_sections,
            vec![("assumptions".to_string(), "A=1".to_string())]
        );
        assert_eq!(progress, text);
    }

    #[test]
    fn test_progress_concatenation_equals_input() {
        let mut ex = extractor();
        let deltas = ["plain ", "text, no ", "tags at all"];
        let mut progress = String::new();

        for delta in deltas {
            for event in ex.feed(delta) {
                if let ExtractorEvent::Progress { delta } = event {
                    progress.push_str(&delta);
                }
            }
        }

        assert_eq!(progress, deltas.concat());
    }

    #[test]
    fn test_progress_emitted_exactly_once_per_feed() {
        let mut ex = extractor();
        let events = ex.feed("<assumptions>x</assumptions>");
        let progress_count = events
            .iter()
            .filter(|e| matches!(e, ExtractorEvent::Progress { .. }))
            .count();
        assert_eq!(progress_count, 1);
    }

    #[test]
    fn test_duplicate_start_tag_does_not_open() {
        // Two occurrences of the exact start tag fail the uniqueness guard,
        // so neither opens a section.
        let mut ex = extractor();
        let events = ex.feed("<assumptions>a<assumptions>b</assumptions>");
        assert!(sections(&events).is_empty());
        assert_eq!(ex.open_section(), None);
    }

    #[test]
    fn test_unknown_tags_pass_through() {
        let mut ex = extractor();
        let events = ex.feed("<other>content</other>");
        assert!(sections(&events).is_empty());
        assert_eq!(ex.open_section(), None);
    }

    #[test]
    fn test_earliest_tag_wins() {
        // parameters_provided appears before assumptions in the buffer even
        // though assumptions comes later in the registry order.
        let mut ex = extractor();
        ex.feed("<parameters_provided>T=40");
        assert_eq!(ex.open_section(), Some("parameters_provided"));
    }

    #[test]
    fn test_text_between_sections_is_ignored() {
        let mut ex = extractor();
        ex.feed("preamble <calculation_plan>plan</calculation_plan> interlude ");
        let events = ex.feed("<assumptions>A</assumptions>");
        assert_eq!(
            sections(&events),
            vec![("assumptions".to_string(), "A".to_string())]
        );
    }

    #[test]
    fn test_early_close_on_embedded_end_tag_text() {
        // First-occurrence matching closes at the embedded end tag; the
        // remainder stays in the buffer.
        let mut ex = extractor();
        let events =
            ex.feed("<assumptions>a</assumptions> trailing</assumptions>");
        assert_eq!(
            sections(&events),
            vec![("assumptions".to_string(), "a".to_string())]
        );
    }
}

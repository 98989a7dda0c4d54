/// Tests for the generative-output parsers: numbered research sections,
/// style-guide heading detection, and the PDF sanitizer's deliberate
/// asymmetry with CRM-stored text.
use lead_intake_api::pdf::{sanitize_for_pdf, wrap_line};
use lead_intake_api::research::{extract_section, split_list};
use lead_intake_api::style_guide::parse_guide_sections;

#[cfg(test)]
mod research_sections {
    use super::*;

    const RESPONSE: &str = "\
Some preamble the model added on its own.

1. INDUSTRY INSIGHTS
Local operators are under margin pressure.

2. COMPETITIVE ANALYSIS
Two regional rivals automated intake in 2024.

3. AUTOMATION OPPORTUNITIES
- Quote follow-up sequences
- Document intake OCR
- Weekly KPI digests

8. STYLE GUIDE TOPICS
* Plain-spoken authority
* Outcomes over features
";

    #[test]
    fn sections_are_extracted_by_number_and_label() {
        let insights = extract_section(RESPONSE, 1, "INDUSTRY INSIGHTS");
        assert_eq!(insights, "Local operators are under margin pressure.");

        let competitive = extract_section(RESPONSE, 2, "COMPETITIVE ANALYSIS");
        assert!(competitive.contains("regional rivals"));
    }

    #[test]
    fn missing_sections_become_empty_not_errors() {
        assert_eq!(extract_section(RESPONSE, 4, "ROI ANALYSIS"), "");
        assert_eq!(extract_section(RESPONSE, 7, "RECOMMENDED APPROACH"), "");
    }

    #[test]
    fn list_sections_split_and_strip_markers() {
        let opportunities = split_list(&extract_section(RESPONSE, 3, "AUTOMATION OPPORTUNITIES"));
        assert_eq!(opportunities.len(), 3);
        assert_eq!(opportunities[0], "Quote follow-up sequences");

        let topics = split_list(&extract_section(RESPONSE, 8, "STYLE GUIDE TOPICS"));
        assert_eq!(topics, vec!["Plain-spoken authority", "Outcomes over features"]);
    }

    #[test]
    fn markdown_heading_markers_are_tolerated() {
        let styled = "## 1. INDUSTRY INSIGHTS\nContent here.\n### 2. COMPETITIVE ANALYSIS\nOther.";
        assert_eq!(extract_section(styled, 1, "INDUSTRY INSIGHTS"), "Content here.");
    }
}

#[cfg(test)]
mod guide_sections {
    use super::*;

    #[test]
    fn voice_tone_round_trip() {
        let doc = "## Voice & Tone\nConfident, never smug.\nShort sentences.";
        let sections = parse_guide_sections(doc);
        assert_eq!(
            sections.voice_tone,
            "Confident, never smug.\nShort sentences."
        );
    }

    #[test]
    fn mixed_heading_styles_parse() {
        let doc = "\
## Voice & Tone
Direct.

KEY PHRASES
\"Done this week.\"

## Things to Avoid
Hedging.
";
        let sections = parse_guide_sections(doc);
        assert_eq!(sections.voice_tone, "Direct.");
        assert_eq!(sections.key_phrases, "\"Done this week.\"");
        assert_eq!(sections.things_to_avoid, "Hedging.");
    }

    #[test]
    fn nothing_is_dropped() {
        let doc = "\
Intro line outside any section.

## Branding Rituals
Unusual section the parser does not know.

## Examples
A good cold open.
";
        let sections = parse_guide_sections(doc);
        assert_eq!(sections.examples, "A good cold open.");
        assert!(sections.unsectioned.contains("Intro line outside any section."));
        assert!(sections.unsectioned.contains("Branding Rituals"));
        assert!(sections.unsectioned.contains("Unusual section"));
    }
}

#[cfg(test)]
mod pdf_sanitizer {
    use super::*;

    #[test]
    fn emoji_are_stripped_for_the_attachment_only() {
        let original = "Growth 🚀 with café-grade service ✨";
        let sanitized = sanitize_for_pdf(original);

        assert!(!sanitized.contains('🚀'));
        assert!(sanitized.contains("café"));
        // the source text is untouched; the CRM stores it verbatim
        assert!(original.contains('🚀'));
    }

    #[test]
    fn typographic_punctuation_maps_to_ascii() {
        assert_eq!(sanitize_for_pdf("“quoted” — it’s…"), "\"quoted\" - it's...");
    }

    #[test]
    fn wrapping_preserves_all_words() {
        let line = "the quick brown fox jumps over the lazy dog repeatedly and at length";
        let wrapped = wrap_line(line, 20);
        assert!(wrapped.iter().all(|l| l.len() <= 20));
        assert_eq!(wrapped.join(" "), line);
    }
}

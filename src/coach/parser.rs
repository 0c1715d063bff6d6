//! Best-effort parsing of oracle output into a [`RacePlan`].
//!
//! The first `{` to the last `}` is tried as JSON. If that is not a JSON
//! object, each section is cut out of the text between its header and the
//! header of the section that follows it. Parsing never fails: every section
//! key is present in the result and the raw text is kept in `full_text`.

use serde_json::{Map, Value};

use crate::models::{PlanSection, RacePlan};

const FULL_TEXT_KEY: &str = "fullText";

pub fn parse_race_plan(raw: &str) -> RacePlan {
    let mut sections = match parse_json_object(raw) {
        Some(map) => map,
        None => {
            tracing::debug!("oracle reply is not JSON, extracting sections by header");
            extract_sections(raw)
        }
    };

    // `full_text` is always the raw reply.
    sections.remove(FULL_TEXT_KEY);
    for section in PlanSection::ALL {
        sections
            .entry(section.key())
            .or_insert_with(|| Value::String(String::new()));
    }

    RacePlan {
        sections,
        full_text: raw.to_string(),
    }
}

fn parse_json_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "embedded JSON did not parse");
            None
        }
    }
}

fn extract_sections(raw: &str) -> Map<String, Value> {
    // ASCII lowering keeps byte offsets aligned with `raw`.
    let lowered = raw.to_ascii_lowercase();
    let headers: Vec<String> = PlanSection::ALL
        .iter()
        .map(|s| s.header().to_ascii_lowercase())
        .collect();

    let mut sections = Map::new();
    for (i, section) in PlanSection::ALL.iter().enumerate() {
        let text = match find_header(&lowered, &headers[i], 0) {
            Some(pos) => {
                let start = pos + headers[i].len();
                let end = section_end(&lowered, &headers, i, start);
                clean_section(&raw[start..end]).to_string()
            }
            None => String::new(),
        };
        sections.insert(section.key().to_string(), Value::String(text));
    }
    sections
}

/// The header of the following section bounds a section. When that header
/// is missing, the nearest later header of any other section does, and the
/// last section runs to the end of the text.
fn section_end(lowered: &str, headers: &[String], index: usize, start: usize) -> usize {
    if let Some(pos) = headers
        .get(index + 1)
        .and_then(|next| find_header(lowered, next, start))
    {
        return pos;
    }

    headers
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .filter_map(|(_, other)| find_header(lowered, other, start))
        .min()
        .unwrap_or(lowered.len())
}

/// First occurrence of `header` at or after `from` that opens a line.
/// Only list or markdown decoration (`#`, `*`, `-`, `1.`, `2)`) may precede it.
fn find_header(lowered: &str, header: &str, from: usize) -> Option<usize> {
    lowered[from..]
        .match_indices(header)
        .map(|(offset, _)| from + offset)
        .find(|&pos| {
            let line_start = lowered[..pos].rfind('\n').map_or(0, |nl| nl + 1);
            lowered[line_start..pos].chars().all(is_line_decoration)
        })
}

fn is_line_decoration(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_digit() || matches!(c, '#' | '*' | '-' | '.' | ')')
}

/// Strips header decoration left around a section body: markdown `#`/`*`,
/// a colon after the header, and the enumerator of the following header.
fn clean_section(text: &str) -> &str {
    let is_decoration = |c: char| c.is_whitespace() || matches!(c, '#' | '*' | ':');
    let trimmed = text.trim_matches(is_decoration);
    strip_trailing_enumerator(trimmed).trim_matches(is_decoration)
}

fn strip_trailing_enumerator(text: &str) -> &str {
    let Some(body) = text.strip_suffix('.') else {
        return text;
    };
    let before_digits = body.trim_end_matches(|c: char| c.is_ascii_digit());
    if before_digits.len() == body.len() {
        return text;
    }
    let line_start = before_digits.trim_end_matches([' ', '\t', '#', '*']);
    if line_start.is_empty() || line_start.ends_with('\n') {
        line_start
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_json_is_returned_verbatim() {
        let raw = "Here is your plan:\n{\"overallStrategy\":\"Go hard early\"}\nGood luck!";
        let plan = parse_race_plan(raw);

        assert_eq!(plan.section(PlanSection::OverallStrategy), Some("Go hard early"));
        assert_eq!(plan.full_text, raw);
    }

    #[test]
    fn json_keeps_extra_keys_and_fills_missing_sections() {
        let raw = r#"{"overallStrategy":"Sit in","segmentPlan":["km 0-40: tempo"],"confidence":0.8}"#;
        let plan = parse_race_plan(raw);

        assert_eq!(plan.sections["segmentPlan"], serde_json::json!(["km 0-40: tempo"]));
        assert_eq!(plan.sections["confidence"], serde_json::json!(0.8));
        assert_eq!(plan.section(PlanSection::FinalPush), Some(""));
        for section in PlanSection::ALL {
            assert!(plan.sections.contains_key(section.key()));
        }
    }

    #[test]
    fn falls_back_to_headers_when_json_is_broken() {
        let raw = "Overall Strategy\nStart conservatively.\nPre-Race Preparation\nEat rice.\nStart Strategy\nStay near the front.";
        let plan = parse_race_plan(raw);

        assert_eq!(plan.section(PlanSection::OverallStrategy), Some("Start conservatively."));
        assert_eq!(plan.section(PlanSection::PreRace), Some("Eat rice."));
        assert_eq!(plan.section(PlanSection::StartStrategy), Some("Stay near the front."));
        assert_eq!(plan.section(PlanSection::Nutrition), Some(""));
    }

    #[test]
    fn strips_markdown_and_enumerators() {
        let raw = "## 1. Overall Strategy:\nRide the climbs at threshold.\n\n## 2. Pre-Race Preparation\nCarb load two days out.\n\n3. Start Strategy\nEasy.";
        let plan = parse_race_plan(raw);

        assert_eq!(
            plan.section(PlanSection::OverallStrategy),
            Some("Ride the climbs at threshold.")
        );
        assert_eq!(plan.section(PlanSection::PreRace), Some("Carb load two days out."));
    }

    #[test]
    fn header_match_ignores_case() {
        let raw = "OVERALL STRATEGY: negative split\nFINAL PUSH: empty the tank";
        let plan = parse_race_plan(raw);

        assert_eq!(plan.section(PlanSection::OverallStrategy), Some("negative split"));
        assert_eq!(plan.section(PlanSection::FinalPush), Some("empty the tank"));
    }

    #[test]
    fn out_of_order_headers_stop_at_nearest_header() {
        let raw = "Final Push\nSprint at 200m.\nOverall Strategy\nPatience.";
        let plan = parse_race_plan(raw);

        assert_eq!(plan.section(PlanSection::FinalPush), Some("Sprint at 200m."));
        assert_eq!(plan.section(PlanSection::OverallStrategy), Some("Patience."));
    }

    #[test]
    fn empty_output_still_has_every_section() {
        let plan = parse_race_plan("");
        assert_eq!(plan.sections.len(), PlanSection::ALL.len());
        assert!(plan.sections.values().all(|v| v == ""));
        assert_eq!(plan.full_text, "");
    }

    #[test]
    fn json_array_is_not_a_plan() {
        let plan = parse_race_plan("[1, 2] {not json}");
        assert_eq!(plan.section(PlanSection::OverallStrategy), Some(""));
    }

    #[test]
    fn prose_mentioning_a_header_does_not_end_a_section() {
        let raw = "Overall Strategy\nPace evenly and save matches for the final push.\nPre-Race Preparation\nSleep well.\nStart Strategy\nSit in.";
        let plan = parse_race_plan(raw);

        assert_eq!(
            plan.section(PlanSection::OverallStrategy),
            Some("Pace evenly and save matches for the final push.")
        );
        assert_eq!(plan.section(PlanSection::PreRace), Some("Sleep well."));
        assert_eq!(plan.section(PlanSection::StartStrategy), Some("Sit in."));
        assert_eq!(plan.section(PlanSection::FinalPush), Some(""));
    }

    #[test]
    fn next_section_header_wins_over_an_earlier_unrelated_one() {
        let raw = "Overall Strategy\nRide steady.\nFinal Push\nGo at the flamme rouge.\nPre-Race Preparation\nRest.";
        let plan = parse_race_plan(raw);

        assert_eq!(
            plan.section(PlanSection::OverallStrategy),
            Some("Ride steady.\nFinal Push\nGo at the flamme rouge.")
        );
        assert_eq!(plan.section(PlanSection::PreRace), Some("Rest."));
    }

    #[test]
    fn header_must_open_a_line() {
        assert_eq!(find_header("the final push\nfinal push", "final push", 0), Some(15));
        assert_eq!(find_header("## 9. final push", "final push", 0), Some(6));
        assert_eq!(find_header("empty the tank in the final push", "final push", 0), None);
    }

    #[test]
    fn json_full_text_key_is_not_duplicated() {
        let raw = r#"{"overallStrategy":"Sit in","fullText":"model echo"}"#;
        let plan = parse_race_plan(raw);

        assert!(!plan.sections.contains_key("fullText"));
        assert_eq!(plan.full_text, raw);
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(json.matches("\"fullText\"").count(), 1);
    }

    #[test]
    fn keeps_trailing_years() {
        assert_eq!(strip_trailing_enumerator("Race day in 2026."), "Race day in 2026.");
        assert_eq!(strip_trailing_enumerator("Eat early.\n\n4."), "Eat early.\n\n");
    }
}

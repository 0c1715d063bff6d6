//! Turns a [`RaceContext`] into the prompt sent to the oracle.

use thiserror::Error;

use crate::models::{
    Climb, CurrentForm, PlanSection, RaceContext, RiderProfile, RouteAnalysis, TrainingPlanProgress,
};

pub const SYSTEM_PROMPT: &str = "You are an expert cycling coach and race strategist. \
You write specific, actionable race plans grounded in the route, the rider's \
physiology and their current form. Use watts, heart-rate zones and timings where \
the data allows, and keep advice realistic for the rider described.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("routeAnalysis is required")]
    MissingRouteAnalysis,

    #[error("routeAnalysis.distance must be a non-negative number")]
    InvalidDistance,
}

/// Builds the race-plan prompt.
///
/// Optional sections are left out entirely when their input is absent or
/// carries no values.
pub fn build_race_context(context: &RaceContext) -> Result<String, ValidationError> {
    let route = context
        .route_analysis
        .as_ref()
        .ok_or(ValidationError::MissingRouteAnalysis)?;
    if !route.distance.is_finite() || route.distance < 0.0 {
        return Err(ValidationError::InvalidDistance);
    }

    let mut blocks = vec![
        "Create a detailed race plan for the following event.".to_string(),
        route_block(route),
        climbs_block(&route.climbs),
    ];
    blocks.extend(context.rider_profile.as_ref().and_then(rider_block));
    blocks.extend(context.current_form.as_ref().and_then(form_block));
    blocks.extend(context.training_plan.as_ref().and_then(training_block));
    blocks.push(instructions_block());

    Ok(blocks.join("\n\n"))
}

fn route_block(route: &RouteAnalysis) -> String {
    let mut lines = vec![
        "ROUTE ANALYSIS".to_string(),
        format!("- Distance: {:.1} km", route.distance),
        format!("- Elevation gain: {:.0} m", route.elevation_gain),
        format!("- Elevation loss: {:.0} m", route.elevation_loss),
    ];
    if let Some(score) = route.difficulty_score {
        lines.push(format!("- Difficulty score: {score:.1}"));
    }
    if let Some(minutes) = route.estimated_time {
        lines.push(format!("- Estimated time: {}", format_duration(minutes)));
    }
    lines.join("\n")
}

fn climbs_block(climbs: &[Climb]) -> String {
    if climbs.is_empty() {
        return "CLIMBS\nNo categorized climbs on this route.".to_string();
    }

    let mut lines = vec![format!("CLIMBS ({})", climbs.len())];
    for (i, climb) in climbs.iter().enumerate() {
        let mut line = format!("{}. ", i + 1);
        if let Some(name) = &climb.name {
            line.push_str(name);
            line.push(' ');
        }
        line.push_str(&format!(
            "(Category {})",
            climb.category.as_deref().unwrap_or("uncategorized")
        ));
        if let Some(length) = climb.length {
            line.push_str(&format!(": {length:.1} km"));
        } else {
            line.push(':');
        }
        line.push_str(&format!(" at {:.1}% average", climb.average_gradient));
        if let Some(max) = climb.max_gradient {
            line.push_str(&format!(" (max {max:.1}%)"));
        }
        line.push_str(&format!(
            ", {:.0} m elevation, starts at km {:.1}",
            climb.elevation_gain, climb.start_distance
        ));
        lines.push(line);
    }
    lines.join("\n")
}

fn rider_block(rider: &RiderProfile) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(kind) = &rider.rider_type {
        lines.push(format!("- Rider type: {kind}"));
    }
    if let Some(ftp) = rider.ftp {
        match rider.watts_per_kg() {
            Some(wkg) => lines.push(format!("- FTP: {ftp:.0} W ({wkg:.2} W/kg)")),
            None => lines.push(format!("- FTP: {ftp:.0} W")),
        }
    }
    if let Some(weight) = rider.weight {
        lines.push(format!("- Weight: {weight:.1} kg"));
    }
    if !rider.strengths.is_empty() {
        lines.push(format!("- Strengths: {}", rider.strengths.join(", ")));
    }
    if !rider.weaknesses.is_empty() {
        lines.push(format!("- Weaknesses: {}", rider.weaknesses.join(", ")));
    }
    titled("RIDER PROFILE", lines)
}

fn form_block(form: &CurrentForm) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(readiness) = form.readiness_score {
        lines.push(format!("- Readiness score: {readiness:.0}/100"));
    }
    if let Some(fitness) = form.fitness {
        lines.push(format!("- Fitness (CTL): {fitness:.1}"));
    }
    if let Some(fatigue) = form.fatigue {
        lines.push(format!("- Fatigue (ATL): {fatigue:.1}"));
    }
    if let Some(tsb) = form.form {
        lines.push(format!("- Form (TSB): {tsb:+.1}"));
    }
    if let Some(status) = &form.status {
        lines.push(format!("- Status: {status}"));
    }
    titled("CURRENT FORM", lines)
}

fn training_block(plan: &TrainingPlanProgress) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(pct) = plan.completion_percentage {
        lines.push(format!("- Plan completion: {pct:.0}%"));
    }
    if let Some(target) = &plan.target_rider_type {
        lines.push(format!("- Target rider type: {target}"));
    }
    if let Some(alignment) = plan.alignment_score {
        lines.push(format!("- Alignment with target: {alignment:.0}/100"));
    }
    titled("TRAINING PLAN", lines)
}

fn instructions_block() -> String {
    let mut lines = vec!["Structure the race plan in exactly these sections:".to_string()];
    for (i, section) in PlanSection::ALL.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, section.header()));
    }
    let keys: Vec<&str> = PlanSection::ALL.iter().map(|s| s.key()).collect();
    lines.push(String::new());
    lines.push(format!(
        "Format the reply as a single JSON object with the keys {} and a string value for each.",
        keys.join(", ")
    ));
    lines.join("\n")
}

fn titled(title: &str, lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    Some(format!("{title}\n{}", lines.join("\n")))
}

fn format_duration(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    format!("{}h {:02}m", total / 60, total % 60)
}

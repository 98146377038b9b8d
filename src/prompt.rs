use crate::models::{FarmProfile, Language};

const NOT_SPECIFIED: &str = "Not specified";

fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}

fn language_name(code: &str) -> &'static str {
    Language::from_code(code)
        .map(|lang| lang.display_name())
        .unwrap_or("English")
}

fn area_display(profile: &FarmProfile) -> String {
    let area = profile.area.as_ref();
    let value = match area.and_then(|a| a.value.as_ref()) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => NOT_SPECIFIED.to_string(),
    };
    let unit = or_not_specified(area.and_then(|a| a.unit.as_deref()));
    format!("{value} {unit}")
}

/// Build the single instruction sent to the model for one farmer question.
///
/// Every profile field is rendered, with "Not specified" standing in for
/// anything absent. The reply is requested as a bare JSON object; callers must
/// still treat the reply as untrusted (see [`crate::parser`]).
pub fn build_agricultural_prompt(profile: &FarmProfile, language: &str, question: &str) -> String {
    let language_name = language_name(language);

    let crops = match profile.crops.as_deref() {
        Some(crops) if !crops.is_empty() => crops.join(", "),
        _ => NOT_SPECIFIED.to_string(),
    };

    let location = profile.location.clone().unwrap_or_default();
    let village = or_not_specified(location.village.as_deref());
    let district = or_not_specified(location.district.as_deref());
    let state = or_not_specified(location.state.as_deref());

    let soil = or_not_specified(profile.soil_type.as_deref());
    let irrigation = or_not_specified(profile.irrigation_type.as_deref());
    let season = or_not_specified(profile.season.as_deref());
    let area = area_display(profile);

    format!(
        r#"You are an expert agricultural advisor helping small and marginal farmers in India.

Farm Profile:
- Crops: {crops}
- Location: Village {village}, District {district}, State {state}
- Soil Type: {soil}
- Irrigation: {irrigation}
- Farm Area: {area}
- Current Season: {season}

Farmer's Question: {question}

Instructions:
1. Respond entirely in {language_name}.
2. Be concise: 2-4 short paragraphs.
3. Give practical, actionable advice suited to this farm's region, soil, season and crops.
4. For serious pest, disease, or financial issues, recommend consulting a local agricultural officer or Krishi Vigyan Kendra.
5. Respond ONLY with a JSON object in exactly this format, with no text before or after it:
{{
  "answer": "your detailed answer in {language_name}",
  "confidence": "High" or "Medium" or "Low",
  "sources": ["source 1", "source 2"],
  "suggestions": ["follow-up question 1", "follow-up question 2"]
}}"#
    )
}

use super::AssessmentInput;
use crate::reading::Reading;

/// Builds the forecast prompt with the full history window embedded.
///
/// One line per reading, oldest first, values exactly as stored.
pub fn build_forecast_prompt(history: &[Reading], horizon_hours: u32) -> String {
    let mut prompt = format!(
        r#"You are an environmental forecasting assistant for road ice detection.

The historical data MAY be sparse or limited. If trends are unclear, make
reasonable assumptions and extrapolate anyway. Always produce a forecast.

Given the timestamped sensor readings below, predict the next {horizon} hours
in 1-hour intervals, labelled "+1h" through "+{horizon}h".

Return ONLY valid JSON in exactly this format:

{{
  "forecast": [
    {{
      "hour": "+1h",
      "temperature": number,
      "humidity": number,
      "risk": "LOW|MEDIUM|HIGH"
    }}
  ],
  "summary": "one short sentence"
}}

Historical data (timestamp | topic | value):
"#,
        horizon = horizon_hours
    );

    if history.is_empty() {
        prompt.push_str("(no readings recorded in this window)\n");
    }
    for reading in history {
        prompt.push_str(&format!(
            "{} | {} | {}\n",
            reading.timestamp, reading.topic, reading.value
        ));
    }

    prompt
}

/// Builds the point-in-time black ice assessment prompt.
pub fn build_assessment_prompt(input: &AssessmentInput) -> String {
    format!(
        r#"You are an AI system detecting black ice risk on roads.

Sensor inputs:
- Temperature: {temperature} °C
- Humidity: {humidity} %
- Wetness sensor: {wetness} (0-4095)

Classify the risk as LOW, MEDIUM, or HIGH.
Return ONLY JSON in this exact format:
{{"risk":"LOW|MEDIUM|HIGH","message":"one short sentence","actions":["action1","action2"]}}
"#,
        temperature = input.temperature,
        humidity = input.humidity,
        wetness = input.wetness_raw,
    )
}

use serde::Serialize;

/// Sensor category derived from a topic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorCategory {
    Temperature,
    Humidity,
    Soil,
    Unknown,
}

/// Classifies a topic by case-insensitive substring match.
///
/// Priority order:
/// - contains "temp" → Temperature
/// - contains "hum" → Humidity
/// - contains "soil" or "moist" → Soil
/// - anything else → Unknown
///
/// This is a heuristic over free-form topic names, not a schema. A topic such
/// as "humidity/temp-compensated" lands in Temperature because "temp" is
/// checked first; that is accepted.
pub fn classify(topic: &str) -> SensorCategory {
    let topic = topic.to_lowercase();

    if topic.contains("temp") {
        SensorCategory::Temperature
    } else if topic.contains("hum") {
        SensorCategory::Humidity
    } else if topic.contains("soil") || topic.contains("moist") {
        SensorCategory::Soil
    } else {
        SensorCategory::Unknown
    }
}

use crate::models::WeatherReading;

pub const ANALYZE_SYSTEM: &str = include_str!("../data/prompts/analyze_system.txt");
pub const ANALYZE_USER: &str = include_str!("../data/prompts/analyze_user.txt");
pub const REWRITE_SYSTEM: &str = include_str!("../data/prompts/rewrite_system.txt");
pub const REWRITE_USER: &str = include_str!("../data/prompts/rewrite_user.txt");
pub const CHATBOT_SYSTEM: &str = include_str!("../data/prompts/chatbot_system.txt");
pub const WEATHER_SYSTEM: &str = include_str!("../data/prompts/weather_system.txt");
pub const WEATHER_USER: &str = include_str!("../data/prompts/weather_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Format a reading so whole numbers keep their decimal point (`30.0`, not `30`).
pub fn format_reading(value: f64) -> String {
    format!("{:?}", value)
}

pub fn weather_user(reading: &WeatherReading) -> String {
    render(
        WEATHER_USER,
        &[
            ("temperature", &format_reading(reading.temperature)),
            ("humidity", &format_reading(reading.humidity)),
            ("windspeed", &format_reading(reading.windspeed)),
            ("pressure", &format_reading(reading.pressure)),
        ],
    )
}

pub fn rewrite_user(text: &str) -> String {
    render(REWRITE_USER, &[("text", text)])
}

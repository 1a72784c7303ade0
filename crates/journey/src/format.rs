//! Display helpers for elapsed time, speed and distance.

/// `MM:SS`, or `HH:MM:SS` once an hour has passed.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let seconds = (elapsed_ms / 1000) % 60;
    let minutes = (elapsed_ms / (1000 * 60)) % 60;
    let hours = elapsed_ms / (1000 * 60 * 60);

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Speed in km/h with one decimal.
pub fn format_speed(speed_mps: f64) -> String {
    format!("{:.1} km/h", speed_mps * 3.6)
}

/// Metres below one kilometre, kilometres with two decimals above.
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{:.0} m", distance_km * 1000.0)
    } else {
        format!("{distance_km:.2} km")
    }
}

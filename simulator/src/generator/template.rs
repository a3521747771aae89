use std::f64::consts::PI;

/// Ambient light in percent at `t` seconds: a slow sine around `base`.
pub fn light_wave(t: f64, period_secs: f64, base: f64, swing: f64) -> f64 {
    let phase = if period_secs > 0.0 {
        t / period_secs * 2.0 * PI
    } else {
        0.0
    };
    (base + swing * phase.sin()).clamp(0.0, 100.0)
}

/// ADC reading a divider at `light_percent` would produce.
pub fn light_to_adc(light_percent: f64) -> f64 {
    light_percent / 100.0 * 4095.0
}

pub fn parse_snap_px(input: &str) -> Result<f64, String> {
    let value = input
        .trim_end_matches("px")
        .parse::<f64>()
        .map_err(|_| String::from("Invalid pixel distance"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(String::from("Snap distance must be a finite, non-negative number"));
    }

    Ok(value)
}

pub fn parse_precision(input: &str) -> Result<f64, String> {
    let (number, scale) = if let Some(cm) = input.strip_suffix("cm") {
        (cm, 0.01)
    } else if let Some(m) = input.strip_suffix('m') {
        (m, 1.0)
    } else {
        (input, 1.0)
    };

    let value = number
        .parse::<f64>()
        .map_err(|_| String::from("Invalid precision"))?
        * scale;

    if !value.is_finite() || value <= 0.0 {
        return Err(String::from("Precision must be a positive distance"));
    }

    Ok(value)
}

/// True when the value is set and not only whitespace
pub fn is_present(value: Option<&str>) -> bool {
    value.map_or(false, |v| !v.trim().is_empty())
}

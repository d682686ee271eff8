/// Renders an amount the way the dashboard shows it: `₹1,23,456.78`.
///
/// Indian digit grouping (last three digits, then pairs), two decimals,
/// rounded half away from zero.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("₹{amount}");
    }

    let scaled = (amount.abs() * 100.0).round();
    if scaled >= u64::MAX as f64 {
        // Past 2^53 every f64 is a whole number, so there are no paise to show.
        let sign = if amount < 0.0 { "-" } else { "" };
        let rupees = format!("{:.0}", amount.abs());
        return format!("{sign}₹{}.00", group_indian(&rupees));
    }

    let paise = scaled as u64;
    let sign = if amount < 0.0 && paise > 0 { "-" } else { "" };
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    format!("{sign}₹{}.{fraction:02}", group_indian(&rupees))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

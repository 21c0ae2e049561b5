use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::metrics::engine::KpiBundle;
use crate::metrics::KpiDelta;
use crate::types::Money;

const STRONG_REVIEW_SCORE: Decimal = dec!(4.0);
const FAST_DELIVERY_DAYS: Decimal = dec!(5);
const ACCEPTABLE_DELIVERY_DAYS: Decimal = dec!(10);

/// Insert thousands separators into a decimal rendered with `dp` places.
fn grouped(value: Decimal, dp: u32) -> String {
    let rendered = format!("{:.*}", dp as usize, value.abs().round_dp(dp));
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered.clone(), None),
    };

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(&f);
    }
    if value.is_sign_negative() && !value.round_dp(dp).is_zero() {
        out.insert(0, '-');
    }
    out
}

/// Render a currency amount for a KPI card.
///
/// Abbreviated form uses `$1.2M` / `$850K` / `$420`; the long form is a
/// whole-dollar amount with separators. A value that rounds up to the next
/// unit is shown in that unit (`$999,700` is `$1.0M`, not `$1000K`).
pub fn format_currency(value: Money, abbreviated: bool) -> String {
    if !abbreviated {
        return format!("${}", grouped(value, 0));
    }
    let thousand = dec!(1_000);
    let dollars = value.round_dp(0);
    let thousands = (value / thousand).round_dp(0);
    if thousands.abs() >= thousand {
        format!("${:.1}M", (value / dec!(1_000_000)).round_dp(1))
    } else if dollars.abs() >= thousand {
        format!("${:.0}K", thousands)
    } else {
        format!("${:.0}", dollars)
    }
}

/// Arrow plus absolute percentage change, or "N/A" when undefined.
pub fn trend_indicator(delta: &KpiDelta) -> String {
    match delta.pct_change {
        Some(pct) => {
            let arrow = if pct >= Decimal::ZERO { "↑" } else { "↓" };
            format!("{} {:.2}%", arrow, pct.abs().round_dp(2))
        }
        None => "N/A".to_string(),
    }
}

fn pct_or_na(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{:.2}%", v.round_dp(2)))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Plain-text business performance report with rule-based insights.
pub fn business_summary(bundle: &KpiBundle) -> String {
    let revenue = bundle.total_revenue.current.unwrap_or_default();
    let orders = bundle.total_orders.current.unwrap_or_default();
    let or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        "BUSINESS PERFORMANCE SUMMARY".to_string(),
        "=".repeat(28),
        String::new(),
        "Revenue:".to_string(),
        format!("- Total Revenue: ${}", grouped(revenue, 2)),
        format!(
            "- Revenue Growth: {}",
            pct_or_na(bundle.total_revenue.pct_change)
        ),
        format!(
            "- Period: {} vs {}",
            bundle.current_period, bundle.comparison_period
        ),
        String::new(),
        "Orders:".to_string(),
        format!("- Total Orders: {}", grouped(orders, 0)),
        format!(
            "- Order Growth: {}",
            pct_or_na(bundle.total_orders.pct_change)
        ),
        format!(
            "- Average Order Value: {}",
            or_na(
                bundle
                    .average_order_value
                    .current
                    .map(|v| format!("${}", grouped(v, 2)))
            )
        ),
        format!(
            "- AOV Growth: {}",
            pct_or_na(bundle.average_order_value.pct_change)
        ),
        String::new(),
        "Customer Experience:".to_string(),
        format!(
            "- Average Review Score: {}",
            or_na(
                bundle
                    .average_review_score
                    .current
                    .map(|v| format!("{:.2}/5.0", v.round_dp(2)))
            )
        ),
        format!(
            "- Average Delivery Time: {}",
            or_na(
                bundle
                    .average_delivery_days
                    .current
                    .map(|v| format!("{:.1} days", v.round_dp(1)))
            )
        ),
        String::new(),
        "Key Insights:".to_string(),
    ];
    lines.extend(insights(bundle).into_iter().map(|line| format!("- {line}")));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

/// Rule-based observations on revenue trend, satisfaction and delivery speed.
pub fn insights(bundle: &KpiBundle) -> Vec<String> {
    let mut out = Vec::new();

    match bundle.total_revenue.pct_change {
        Some(g) if g < Decimal::ZERO => out.push(format!(
            "Revenue declined by {:.1}%, indicating potential market challenges",
            g.abs().round_dp(1)
        )),
        Some(g) => out.push(format!(
            "Revenue grew by {:.1}%, showing positive business growth",
            g.round_dp(1)
        )),
        None => out.push("Revenue growth is undefined: no comparison-period revenue".to_string()),
    }

    if let Some(score) = bundle.average_review_score.current {
        if score >= STRONG_REVIEW_SCORE {
            out.push(format!(
                "Customer satisfaction is strong with {:.1}/5.0 average rating",
                score.round_dp(1)
            ));
        } else {
            out.push(format!(
                "Customer satisfaction needs attention with {:.1}/5.0 average rating",
                score.round_dp(1)
            ));
        }
    }

    if let Some(days) = bundle.average_delivery_days.current {
        if days <= FAST_DELIVERY_DAYS {
            out.push("Delivery performance is excellent with fast shipping times".to_string());
        } else if days <= ACCEPTABLE_DELIVERY_DAYS {
            out.push("Delivery performance is acceptable but could be improved".to_string());
        } else {
            out.push("Delivery times are slow and may impact customer satisfaction".to_string());
        }
    }

    out
}

// src/models/stats.rs

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::{common::error::AppError, models::money::to_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    Yesterday,
    /// Últimos 7 dias
    Week,
    /// Últimos 30 dias
    Month,
    #[default]
    All,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub period: Option<StatsPeriod>,
    /// Sobrepõe `period` quando informado
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
}

/// Janela semiaberta `[from, to)` em UTC. `None` = sem limite daquele lado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl DateWindow {
    /// Datas explícitas; `end` é inclusiva (vira meia-noite do dia seguinte).
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(AppError::InvalidInput("startDate must not be after endDate".into()));
            }
        }
        Ok(Self {
            from: start.map(start_of),
            to: end.and_then(|e| e.checked_add_days(Days::new(1))).map(start_of),
        })
    }

    pub fn for_period(period: StatsPeriod, now: DateTime<Utc>) -> Self {
        let today = start_of(now.date_naive());
        match period {
            StatsPeriod::Today => Self { from: Some(today), to: None },
            StatsPeriod::Yesterday => Self { from: Some(today - Duration::days(1)), to: Some(today) },
            StatsPeriod::Week => Self { from: Some(now - Duration::days(7)), to: None },
            StatsPeriod::Month => Self { from: Some(now - Duration::days(30)), to: None },
            StatsPeriod::All => Self::default(),
        }
    }

    pub fn resolve(query: &StatsQuery, now: DateTime<Utc>) -> Result<Self, AppError> {
        if query.start_date.is_some() || query.end_date.is_some() {
            return Self::from_dates(query.start_date, query.end_date);
        }
        Ok(Self::for_period(query.period.unwrap_or_default(), now))
    }
}

// Linha agregada do SELECT de totais
#[derive(Debug, Clone, Default, FromRow)]
pub struct SalesTotals {
    pub total_sales: i64,
    pub total_items_sold: i64,
    pub total_revenue: Decimal,
    pub largest_sale: Decimal,
    pub smallest_sale: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TopProduct {
    pub inventory_item_id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    #[schema(example = 12)]
    pub total_quantity: i64,
    #[schema(example = 60.0)]
    pub total_revenue: Decimal,
    #[schema(example = 4)]
    pub sale_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_items_sold: i64,
    pub total_revenue: Decimal,
    pub average_sale_amount: Decimal,
    pub largest_sale: Decimal,
    pub smallest_sale: Decimal,
    #[serde(rename = "topProducts")]
    pub top_products: Vec<TopProduct>,
}

impl SalesStats {
    pub fn from_parts(totals: SalesTotals, top_products: Vec<TopProduct>) -> Self {
        // Sem vendas a média é 0, nunca divisão por zero
        let average_sale_amount = if totals.total_sales > 0 {
            to_cents(totals.total_revenue / Decimal::from(totals.total_sales))
        } else {
            Decimal::ZERO
        };

        Self {
            total_sales: totals.total_sales,
            total_items_sold: totals.total_items_sold,
            total_revenue: totals.total_revenue,
            average_sale_amount,
            largest_sale: totals.largest_sale,
            smallest_sale: totals.smallest_sale,
            top_products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    // Mesma semântica do `created_at >= from AND created_at < to` das queries
    fn contains(window: &DateWindow, at: DateTime<Utc>) -> bool {
        window.from.is_none_or(|from| at >= from) && window.to.is_none_or(|to| at < to)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn end_date_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let window = DateWindow::from_dates(Some(d(1)), Some(d(15))).unwrap();
        assert!(contains(&window, Utc.with_ymd_and_hms(2025, 3, 15, 23, 59, 59).unwrap()));
        assert!(!contains(&window, Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap()));
        assert!(contains(&window, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
        assert!(!contains(&window, Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        assert!(matches!(DateWindow::from_dates(Some(d(10)), Some(d(2))), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn yesterday_ends_at_midnight() {
        let w = DateWindow::for_period(StatsPeriod::Yesterday, noon());
        assert_eq!(w.from, Some(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()));
        assert_eq!(w.to, Some(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn explicit_dates_override_period() {
        let query = StatsQuery {
            period: Some(StatsPeriod::Today),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: None,
        };
        let w = DateWindow::resolve(&query, noon()).unwrap();
        assert_eq!(w.from, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(w.to, None);

        let all = DateWindow::resolve(&StatsQuery::default(), noon()).unwrap();
        assert_eq!(all, DateWindow::default());
    }

    #[test]
    fn average_is_zero_without_sales() {
        let stats = SalesStats::from_parts(SalesTotals::default(), vec![]);
        assert_eq!(stats.average_sale_amount, Decimal::ZERO);
        assert_eq!(stats.total_sales, 0);
    }

    #[test]
    fn average_is_rounded_to_cents() {
        let totals = SalesTotals {
            total_sales: 3,
            total_items_sold: 3,
            total_revenue: dec!(10.00),
            largest_sale: dec!(5.00),
            smallest_sale: dec!(2.00),
        };
        let stats = SalesStats::from_parts(totals, vec![]);
        assert_eq!(stats.average_sale_amount, dec!(3.33));
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("topProducts").is_some());
    }
}

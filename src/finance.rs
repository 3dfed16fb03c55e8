use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::auth::require_photographer;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input;
use crate::models::{Session, SessionStatus, Transaction, TransactionType, User};

const MAX_BUCKETS: usize = 520;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::validation("from must be before to"));
        }
        Ok(Window { start, end })
    }

    pub fn all_time() -> Self {
        Window {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub income: i64,
    pub expense: i64,
    pub profit: i64,
    pub session_count: usize,
    pub client_count: usize,
    pub average_session_value: i64,
    pub hours_worked: f64,
}

// Totals are summed wide and narrowed once.
fn narrow(total: i128) -> AppResult<i64> {
    i64::try_from(total).map_err(|_| AppError::validation("totals are out of range"))
}

/// Income transactions plus session `amountPaid`. A session's payment is
/// skipped when an income transaction in the same set references it.
pub fn aggregate_income(transactions: &[Transaction], sessions: &[Session]) -> AppResult<i64> {
    let covered: HashSet<i64> = transactions
        .iter()
        .filter(|t| t.kind == TransactionType::Income)
        .filter_map(|t| t.session_id)
        .collect();
    let recorded: i128 = transactions
        .iter()
        .filter(|t| t.kind == TransactionType::Income)
        .map(|t| i128::from(t.amount))
        .sum();
    let from_sessions: i128 = sessions
        .iter()
        .filter(|s| s.amount_paid > 0 && !covered.contains(&s.id))
        .map(|s| i128::from(s.amount_paid))
        .sum();
    narrow(recorded + from_sessions)
}

pub fn aggregate_expense(transactions: &[Transaction]) -> AppResult<i64> {
    narrow(
        transactions
            .iter()
            .filter(|t| t.kind == TransactionType::Expense)
            .map(|t| i128::from(t.amount.unsigned_abs()))
            .sum(),
    )
}

/// Canceled sessions still count toward income through `amountPaid`, but
/// not toward the session, client or hours figures.
pub fn summarize(transactions: &[Transaction], sessions: &[Session]) -> AppResult<FinancialSummary> {
    let income = aggregate_income(transactions, sessions)?;
    let expense = aggregate_expense(transactions)?;
    let worked: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.status != SessionStatus::Canceled)
        .collect();
    let clients: HashSet<i64> = worked.iter().map(|s| s.client_id).collect();
    let minutes: i64 = worked.iter().map(|s| i64::from(s.duration)).sum();
    let booked: i128 = worked.iter().map(|s| i128::from(s.total_price)).sum();
    let average_session_value = if worked.is_empty() {
        0
    } else {
        (booked as f64 / worked.len() as f64).round() as i64
    };

    Ok(FinancialSummary {
        income,
        expense,
        profit: narrow(i128::from(income) - i128::from(expense))?,
        session_count: worked.len(),
        client_count: clients.len(),
        average_session_value,
        hours_worked: minutes as f64 / 60.0,
    })
}

pub fn summarize_window(
    window: &Window,
    transactions: &[Transaction],
    sessions: &[Session],
) -> AppResult<FinancialSummary> {
    let transactions: Vec<Transaction> = transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .cloned()
        .collect();
    let sessions: Vec<Session> = sessions
        .iter()
        .filter(|s| window.contains(s.date))
        .cloned()
        .collect();
    summarize(&transactions, &sessions)
}

/// `(current - previous) / previous * 100`; a zero baseline reads as 100%
/// growth when anything happened and 0% otherwise.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Week,
    #[default]
    Month,
    Year,
}

/// A UTC calendar period. Weeks are ISO weeks starting on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Year(i32),
    Month(i32, u32),
    Week(i32, u32),
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

impl Bucket {
    pub fn of(granularity: Granularity, at: DateTime<Utc>) -> Bucket {
        match granularity {
            Granularity::Year => Bucket::Year(at.year()),
            Granularity::Month => Bucket::Month(at.year(), at.month()),
            Granularity::Week => {
                let week = at.iso_week();
                Bucket::Week(week.year(), week.week())
            }
        }
    }

    fn start_date(self) -> Option<NaiveDate> {
        match self {
            Bucket::Year(year) => first_of_month(year, 1),
            Bucket::Month(year, month) => first_of_month(year, month),
            Bucket::Week(year, week) => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon),
        }
    }

    fn next(self) -> Option<Bucket> {
        match self {
            Bucket::Year(year) => Some(Bucket::Year(year + 1)),
            Bucket::Month(year, 12) => Some(Bucket::Month(year + 1, 1)),
            Bucket::Month(year, month) => Some(Bucket::Month(year, month + 1)),
            Bucket::Week(..) => {
                let next_monday = self.start_date()? + Duration::days(7);
                let week = next_monday.iso_week();
                Some(Bucket::Week(week.year(), week.week()))
            }
        }
    }

    pub fn window(self) -> AppResult<Window> {
        let out_of_range = || AppError::validation("date is out of range");
        let start = self.start_date().ok_or_else(out_of_range)?;
        let end = self
            .next()
            .and_then(Bucket::start_date)
            .ok_or_else(out_of_range)?;
        Window::new(midnight(start), midnight(end))
    }

    pub fn label(self) -> String {
        match self {
            Bucket::Year(year) => format!("{year}"),
            Bucket::Month(year, month) => format!("{year}-{month:02}"),
            Bucket::Week(year, week) => format!("{year}-W{week:02}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: FinancialSummary,
}

/// Splits `window` into calendar buckets and reconciles each on its own.
/// Buckets at the edges are clipped to the window.
pub fn breakdown(
    granularity: Granularity,
    window: &Window,
    transactions: &[Transaction],
    sessions: &[Session],
) -> AppResult<Vec<BucketSummary>> {
    let mut buckets = Vec::new();
    let mut bucket = Some(Bucket::of(granularity, window.start));
    while let Some(current) = bucket {
        let period = current.window()?;
        if period.start >= window.end {
            break;
        }
        if buckets.len() == MAX_BUCKETS {
            return Err(AppError::validation(format!(
                "Range covers more than {MAX_BUCKETS} periods"
            )));
        }
        let clipped = Window {
            start: period.start.max(window.start),
            end: period.end.min(window.end),
        };
        buckets.push(BucketSummary {
            label: current.label(),
            start: period.start,
            end: period.end,
            summary: summarize_window(&clipped, transactions, sessions)?,
        });
        bucket = current.next();
    }
    Ok(buckets)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
    pub sessions: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub period: Granularity,
    pub current_period: Window,
    pub previous_period: Window,
    pub current: FinancialSummary,
    pub previous: FinancialSummary,
    pub changes: Changes,
}

/// Compares the period containing `reference` with the one right before it.
pub fn compare(
    granularity: Granularity,
    reference: DateTime<Utc>,
    transactions: &[Transaction],
    sessions: &[Session],
) -> AppResult<Comparison> {
    let current_period = Bucket::of(granularity, reference).window()?;
    let previous_period =
        Bucket::of(granularity, current_period.start - Duration::days(1)).window()?;
    let current = summarize_window(&current_period, transactions, sessions)?;
    let previous = summarize_window(&previous_period, transactions, sessions)?;

    Ok(Comparison {
        period: granularity,
        current_period,
        previous_period,
        changes: Changes {
            income: percent_change(current.income as f64, previous.income as f64),
            expense: percent_change(current.expense as f64, previous.expense as f64),
            profit: percent_change(current.profit as f64, previous.profit as f64),
            sessions: percent_change(current.session_count as f64, previous.session_count as f64),
        },
        current,
        previous,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthProjection {
    pub month: u32,
    pub label: String,
    pub income: i64,
    pub expense: i64,
    pub projected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: i32,
    pub months: Vec<MonthProjection>,
    pub average_monthly_income: i64,
    pub average_monthly_expense: i64,
    pub projected_income: i64,
    pub projected_expense: i64,
}

/// Months up to `today`'s month keep their actual totals. Later months get
/// the average of the months that had any activity.
pub fn project_year(
    year: i32,
    today: NaiveDate,
    transactions: &[Transaction],
    sessions: &[Session],
) -> AppResult<YearProjection> {
    Bucket::Year(year).window()?;
    let actual_months = match year.cmp(&today.year()) {
        std::cmp::Ordering::Less => 12,
        std::cmp::Ordering::Equal => today.month(),
        std::cmp::Ordering::Greater => 0,
    };

    let mut months = Vec::with_capacity(12);
    let (mut total_income, mut total_expense, mut months_with_data) = (0i128, 0i128, 0i64);
    for month in 1..=actual_months {
        let window = Bucket::Month(year, month).window()?;
        let has_data = transactions.iter().any(|t| window.contains(t.date))
            || sessions.iter().any(|s| window.contains(s.date));
        let summary = summarize_window(&window, transactions, sessions)?;
        if has_data {
            months_with_data += 1;
        }
        total_income += i128::from(summary.income);
        total_expense += i128::from(summary.expense);
        months.push(MonthProjection {
            month,
            label: Bucket::Month(year, month).label(),
            income: summary.income,
            expense: summary.expense,
            projected: false,
        });
    }

    let (average_income, average_expense) = if months_with_data == 0 {
        (0, 0)
    } else {
        (
            (total_income as f64 / months_with_data as f64).round() as i64,
            (total_expense as f64 / months_with_data as f64).round() as i64,
        )
    };
    for month in actual_months + 1..=12 {
        months.push(MonthProjection {
            month,
            label: Bucket::Month(year, month).label(),
            income: average_income,
            expense: average_expense,
            projected: true,
        });
    }

    Ok(YearProjection {
        year,
        projected_income: narrow(months.iter().map(|m| i128::from(m.income)).sum())?,
        projected_expense: narrow(months.iter().map(|m| i128::from(m.expense)).sum())?,
        months,
        average_monthly_income: average_income,
        average_monthly_expense: average_expense,
    })
}

// ── Reports for the requesting photographer ──

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub to: Option<DateTime<Utc>>,
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareQuery {
    pub period: Option<Granularity>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionQuery {
    pub year: Option<i32>,
}

async fn ledger_of(store: &dyn Store, requester: &User) -> AppResult<(Vec<Transaction>, Vec<Session>)> {
    require_photographer(requester)?;
    let transactions = store.list_transactions(requester.id).await?;
    let sessions = store.list_sessions_by_photographer(requester.id).await?;
    Ok((transactions, sessions))
}

pub async fn summary_report(
    store: &dyn Store,
    requester: &User,
    query: &RangeQuery,
) -> AppResult<FinancialSummary> {
    let (transactions, sessions) = ledger_of(store, requester).await?;
    let all = Window::all_time();
    let window = Window::new(query.from.unwrap_or(all.start), query.to.unwrap_or(all.end))?;
    summarize_window(&window, &transactions, &sessions)
}

/// Without `from`/`to` the breakdown covers the current calendar year.
pub async fn breakdown_report(
    store: &dyn Store,
    requester: &User,
    query: &RangeQuery,
    now: DateTime<Utc>,
) -> AppResult<Vec<BucketSummary>> {
    let (transactions, sessions) = ledger_of(store, requester).await?;
    let this_year = Bucket::Year(now.year()).window()?;
    let window = Window::new(
        query.from.unwrap_or(this_year.start),
        query.to.unwrap_or(this_year.end),
    )?;
    breakdown(
        query.granularity.unwrap_or_default(),
        &window,
        &transactions,
        &sessions,
    )
}

pub async fn compare_report(
    store: &dyn Store,
    requester: &User,
    query: &CompareQuery,
    now: DateTime<Utc>,
) -> AppResult<Comparison> {
    let (transactions, sessions) = ledger_of(store, requester).await?;
    compare(
        query.period.unwrap_or_default(),
        query.date.unwrap_or(now),
        &transactions,
        &sessions,
    )
}

pub async fn projection_report(
    store: &dyn Store,
    requester: &User,
    query: &ProjectionQuery,
    now: DateTime<Utc>,
) -> AppResult<YearProjection> {
    let (transactions, sessions) = ledger_of(store, requester).await?;
    let today = now.date_naive();
    project_year(query.year.unwrap_or(today.year()), today, &transactions, &sessions)
}

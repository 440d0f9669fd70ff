use crate::{
    error::Result,
    notification::notification_models::{NotificationType, VisitResult},
    stats::{
        stats_models::{
            AgentPerformance, DailyStats, GeneralStats, ResultCount, TypeCount, ZoneStats,
        },
        stats_repository::StatsRepository,
    },
};

const DAILY_WINDOW_DAYS: i32 = 30;

/// Share of completed notices, in percent rounded to two decimals; 0 when nothing was assigned.
pub fn completion_percentage(completed: i64, total: i64) -> f64 {
    if total > 0 {
        ((completed as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    }
}

#[derive(Clone)]
pub struct StatsService {
    repo: StatsRepository,
}

impl StatsService {
    pub fn new(repo: StatsRepository) -> Self {
        Self { repo }
    }

    pub async fn general(&self) -> Result<GeneralStats> {
        self.repo.general().await
    }

    pub async fn by_type(&self) -> Result<Vec<TypeCount>> {
        let mut rows = self.repo.by_type().await?;
        for row in &mut rows {
            row.label = row
                .tipo
                .parse::<NotificationType>()
                .map(|t| t.label().to_string())
                .unwrap_or_else(|_| row.tipo.clone());
        }
        Ok(rows)
    }

    pub async fn by_result(&self) -> Result<Vec<ResultCount>> {
        let mut rows = self.repo.by_result().await?;
        for row in &mut rows {
            row.label = row
                .result
                .parse::<VisitResult>()
                .map(|r| r.label().to_string())
                .unwrap_or_else(|_| row.result.clone());
        }
        Ok(rows)
    }

    pub async fn by_agent(&self) -> Result<Vec<AgentPerformance>> {
        let mut rows = self.repo.by_agent().await?;
        for row in &mut rows {
            row.percentage = completion_percentage(row.completed, row.total);
        }
        Ok(rows)
    }

    pub async fn by_zone(&self) -> Result<Vec<ZoneStats>> {
        self.repo.by_zone().await
    }

    pub async fn daily(&self) -> Result<Vec<DailyStats>> {
        self.repo.daily(DAILY_WINDOW_DAYS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(2, 3), 66.67);
        assert_eq!(completion_percentage(5, 5), 100.0);
    }
}

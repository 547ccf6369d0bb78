use crate::models::{Breakdown, ClassicRace, CompetitionGroup, GroupBreakdown, TourStage};
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use duckdb::{Connection, Transaction, params};
use std::path::Path;
use tracing::{debug, info};

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS competition_groups (
    url         VARCHAR PRIMARY KEY,
    name        VARCHAR NOT NULL,
    gender      VARCHAR NOT NULL,
    group_type  VARCHAR NOT NULL,
    scraped_at  TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS tour_stages (
    group_url   VARCHAR   NOT NULL,
    url         VARCHAR   NOT NULL,
    description VARCHAR   NOT NULL,
    stage_count INTEGER   NOT NULL,
    tour_size   VARCHAR   NOT NULL,
    start_date  TIMESTAMP NOT NULL,
    -- Before start_date when the stages table listed nothing
    end_date    TIMESTAMP NOT NULL,
    scraped_at  TIMESTAMP NOT NULL,
    PRIMARY KEY (group_url, url)
);

CREATE TABLE IF NOT EXISTS classic_races (
    group_url   VARCHAR   NOT NULL,
    race_date   TIMESTAMP NOT NULL,
    name        VARCHAR   NOT NULL,
    ordinal     VARCHAR   NOT NULL,
    category    VARCHAR   NOT NULL,
    scraped_at  TIMESTAMP NOT NULL,
    PRIMARY KEY (group_url, race_date, name)
);

CREATE SEQUENCE IF NOT EXISTS scrape_run_ids START 1;

CREATE TABLE IF NOT EXISTS scrape_runs (
    id                  BIGINT PRIMARY KEY DEFAULT nextval('scrape_run_ids'),
    started_at          TIMESTAMP NOT NULL,
    finished_at         TIMESTAMP,
    status              VARCHAR NOT NULL DEFAULT 'running',
    groups_processed    INTEGER DEFAULT 0,
    items_saved         INTEGER DEFAULT 0,
    error_msg           VARCHAR
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

/// Rows written by one [`Repository::save_breakdowns`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub groups: usize,
    pub stages: usize,
    pub races: usize,
}

impl SaveSummary {
    pub fn items(&self) -> usize {
        self.stages + self.races
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Calendar ──────────────────────────────────────────────────────────────

    /// Upsert groups with their stages or races. Idempotent for the same input.
    pub fn save_breakdowns(&self, groups: &[GroupBreakdown]) -> Result<SaveSummary> {
        let now = Utc::now().naive_utc();
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = SaveSummary::default();

        for gb in groups {
            upsert_group(&tx, &gb.group, now)?;
            summary.groups += 1;
            match &gb.breakdown {
                Breakdown::Tours(stages) => {
                    for stage in stages {
                        upsert_stage(&tx, &gb.group.url, stage, now)?;
                    }
                    summary.stages += stages.len();
                }
                Breakdown::Classics(races) => {
                    for race in races {
                        upsert_race(&tx, &gb.group.url, race, now)?;
                    }
                    summary.races += races.len();
                }
            }
            debug!("Saved {} ({} items)", gb.group.name, gb.breakdown.len());
        }

        tx.commit()?;
        Ok(summary)
    }

    pub fn group_count(&self) -> Result<i64> {
        self.count("competition_groups")
    }

    pub fn stage_count(&self) -> Result<i64> {
        self.count("tour_stages")
    }

    pub fn race_count(&self) -> Result<i64> {
        self.count("classic_races")
    }

    fn count(&self, table: &str) -> Result<i64> {
        let mut s = self.conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    /// Earliest start and latest end over every stored tour and race.
    pub fn season_range(&self) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        let mut s = self.conn.prepare(
            r#"SELECT MIN(first_day), MAX(last_day) FROM (
                   SELECT start_date AS first_day, end_date AS last_day FROM tour_stages
                   UNION ALL
                   SELECT race_date, race_date FROM classic_races
               )"#,
        )?;
        Ok(s.query_row([], |r| Ok((r.get(0)?, r.get(1)?)))?)
    }

    // ── Scrape run log ────────────────────────────────────────────────────────

    pub fn begin_scrape_run(&self) -> Result<i64> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO scrape_runs (started_at, status) VALUES (?, 'running') RETURNING id",
            params![Utc::now().naive_utc()],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn finish_scrape_run(
        &self,
        run_id: i64,
        groups: usize,
        items: usize,
        error: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            r#"UPDATE scrape_runs SET
               finished_at = ?, status = ?,
               groups_processed = ?, items_saved = ?, error_msg = ?
               WHERE id = ?"#,
            params![
                Utc::now().naive_utc(),
                if error.is_none() { "success" } else { "error" },
                groups as i64,
                items as i64,
                error,
                run_id,
            ],
        )?;
        Ok(())
    }

    /// Start time and status of the most recent run, if any.
    pub fn last_scrape_run(&self) -> Result<Option<(NaiveDateTime, String)>> {
        let mut s = self
            .conn
            .prepare("SELECT started_at, status FROM scrape_runs ORDER BY id DESC LIMIT 1")?;
        let mut rows = s.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.next().transpose()?)
    }
}

fn upsert_group(tx: &Transaction<'_>, g: &CompetitionGroup, now: NaiveDateTime) -> Result<()> {
    tx.execute(
        r#"INSERT INTO competition_groups (url, name, gender, group_type, scraped_at)
           VALUES (?, ?, ?, ?, ?)
           ON CONFLICT (url) DO UPDATE SET
               name       = excluded.name,
               gender     = excluded.gender,
               group_type = excluded.group_type,
               scraped_at = excluded.scraped_at"#,
        params![g.url, g.name, g.gender.as_str(), g.group_type.as_str(), now],
    )
    .with_context(|| format!("upsert group {}", g.url))?;
    Ok(())
}

fn upsert_stage(
    tx: &Transaction<'_>,
    group_url: &str,
    t: &TourStage,
    now: NaiveDateTime,
) -> Result<()> {
    tx.execute(
        r#"INSERT INTO tour_stages
               (group_url, url, description, stage_count, tour_size,
                start_date, end_date, scraped_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (group_url, url) DO UPDATE SET
               description = excluded.description,
               stage_count = excluded.stage_count,
               tour_size   = excluded.tour_size,
               start_date  = excluded.start_date,
               end_date    = excluded.end_date,
               scraped_at  = excluded.scraped_at"#,
        params![
            group_url,
            t.url,
            t.description,
            t.stage_count as i64,
            t.tour_size.as_str(),
            t.start_date,
            t.end_date,
            now,
        ],
    )
    .with_context(|| format!("upsert stage race {}", t.url))?;
    Ok(())
}

fn upsert_race(
    tx: &Transaction<'_>,
    group_url: &str,
    r: &ClassicRace,
    now: NaiveDateTime,
) -> Result<()> {
    tx.execute(
        r#"INSERT INTO classic_races (group_url, race_date, name, ordinal, category, scraped_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT (group_url, race_date, name) DO UPDATE SET
               ordinal    = excluded.ordinal,
               category   = excluded.category,
               scraped_at = excluded.scraped_at"#,
        params![
            group_url,
            r.date,
            r.name,
            r.ordinal,
            r.category.to_string(),
            now,
        ],
    )
    .with_context(|| format!("upsert race {} {}", r.name, r.date))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, GroupType, TourSize};
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn repo() -> Repository {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        repo
    }

    fn season() -> Vec<GroupBreakdown> {
        vec![
            GroupBreakdown {
                group: CompetitionGroup {
                    name: "Tour de France".into(),
                    gender: Gender::Male,
                    url: "https://www.velogames.com/tour-de-france/2024/".into(),
                    group_type: GroupType::Tour,
                },
                breakdown: Breakdown::Tours(vec![TourStage {
                    url: "https://www.velogames.com/tour-de-france/2024/".into(),
                    description: "Tour de France Men 2024".into(),
                    stage_count: 21,
                    tour_size: TourSize::Grand,
                    start_date: day(6, 29),
                    end_date: day(7, 21),
                }]),
            },
            GroupBreakdown {
                group: CompetitionGroup {
                    name: "Spring Classics".into(),
                    gender: Gender::Male,
                    url: "https://www.velogames.com/spring-classics/2024/".into(),
                    group_type: GroupType::Classics,
                },
                breakdown: Breakdown::Classics(vec![
                    ClassicRace {
                        ordinal: "1".into(),
                        date: day(3, 2),
                        name: "Strade Bianche".into(),
                        category: 'A',
                    },
                    ClassicRace {
                        ordinal: "2".into(),
                        date: day(3, 16),
                        name: "Milano-Sanremo".into(),
                        category: 'M',
                    },
                ]),
            },
        ]
    }

    #[test]
    fn migrations_are_repeatable() {
        let repo = repo();
        repo.run_migrations().unwrap();
        assert_eq!(repo.group_count().unwrap(), 0);
    }

    #[test]
    fn saving_twice_does_not_duplicate() {
        let repo = repo();
        let first = repo.save_breakdowns(&season()).unwrap();
        assert_eq!(
            first,
            SaveSummary {
                groups: 2,
                stages: 1,
                races: 2
            }
        );
        repo.save_breakdowns(&season()).unwrap();

        assert_eq!(repo.group_count().unwrap(), 2);
        assert_eq!(repo.stage_count().unwrap(), 1);
        assert_eq!(repo.race_count().unwrap(), 2);
    }

    #[test]
    fn season_range_spans_tours_and_races() {
        let repo = repo();
        assert_eq!(repo.season_range().unwrap(), (None, None));
        repo.save_breakdowns(&season()).unwrap();
        assert_eq!(
            repo.season_range().unwrap(),
            (Some(day(3, 2)), Some(day(7, 21)))
        );
    }

    #[test]
    fn scrape_runs_get_fresh_ids() {
        let repo = repo();
        assert_eq!(repo.last_scrape_run().unwrap(), None);

        let a = repo.begin_scrape_run().unwrap();
        repo.finish_scrape_run(a, 2, 3, None).unwrap();
        assert_eq!(repo.last_scrape_run().unwrap().unwrap().1, "success");

        let b = repo.begin_scrape_run().unwrap();
        assert!(b > a);
        assert_eq!(repo.last_scrape_run().unwrap().unwrap().1, "running");
        repo.finish_scrape_run(b, 0, 0, Some("group discovery failed"))
            .unwrap();
        assert_eq!(repo.last_scrape_run().unwrap().unwrap().1, "error");
    }
}

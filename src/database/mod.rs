pub mod models;


use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            PRAGMA cache_size=10000;
            PRAGMA temp_store=MEMORY;
        ",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        // Initialize schema
        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                audio_url TEXT,
                duration REAL,
                published_date TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_posts_guid ON posts(guid);

            CREATE TABLE IF NOT EXISTS transcript_segments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                sequence_num INTEGER NOT NULL,
                start_time REAL NOT NULL,
                end_time REAL NOT NULL,
                text TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                UNIQUE(post_id, sequence_num)
            );

            CREATE INDEX IF NOT EXISTS idx_segments_post ON transcript_segments(post_id);

            CREATE TABLE IF NOT EXISTS identifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transcript_segment_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 1.0,
                model_used TEXT,
                created_at TEXT DEFAULT (datetime('now')),
                FOREIGN KEY (transcript_segment_id) REFERENCES transcript_segments(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_identifications_segment
                ON identifications(transcript_segment_id);
            CREATE INDEX IF NOT EXISTS idx_identifications_label
                ON identifications(label);

            CREATE TABLE IF NOT EXISTS segment_overrides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                start_time REAL NOT NULL,
                end_time REAL NOT NULL,
                user_approved INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_overrides_post ON segment_overrides(post_id);

            CREATE TABLE IF NOT EXISTS processing_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_guid TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                current_step INTEGER NOT NULL DEFAULT 0,
                total_steps INTEGER NOT NULL DEFAULT 5,
                segments_approved INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                started_at TEXT,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_guid_status
                ON processing_jobs(post_guid, status);
        "#,
        )?;

        Ok(())
    }

    // =========================================================================
    // Post queries
    // =========================================================================

    /// Insert a new post or update if it exists (by guid)
    pub fn upsert_post(
        &self,
        guid: &str,
        title: &str,
        audio_url: Option<&str>,
        duration: Option<f64>,
        published_date: Option<&str>,
    ) -> Result<(i64, bool)> {
        let conn = self.conn.lock().unwrap();

        let existing_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM posts WHERE guid = ?",
                params![guid],
                |row| row.get(0),
            )
            .ok();

        if let Some(id) = existing_id {
            conn.execute(
                "UPDATE posts SET
                    title = ?,
                    audio_url = COALESCE(?, audio_url),
                    duration = COALESCE(?, duration),
                    published_date = COALESCE(?, published_date)
                 WHERE id = ?",
                params![title, audio_url, duration, published_date, id],
            )?;
            Ok((id, false))
        } else {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO posts (guid, title, audio_url, duration, published_date, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![guid, title, audio_url, duration, published_date, now],
            )?;
            Ok((conn.last_insert_rowid(), true))
        }
    }

    pub fn get_post_by_guid(&self, guid: &str) -> Result<Option<Post>> {
        let conn = self.conn.lock().unwrap();
        let post = conn
            .query_row(
                "SELECT id, guid, title, audio_url, duration, published_date, created_at
                 FROM posts WHERE guid = ?",
                params![guid],
                Self::map_post,
            )
            .optional()?;
        Ok(post)
    }

    pub fn get_post_by_id(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.conn.lock().unwrap();
        let post = conn
            .query_row(
                "SELECT id, guid, title, audio_url, duration, published_date, created_at
                 FROM posts WHERE id = ?",
                params![id],
                Self::map_post,
            )
            .optional()?;
        Ok(post)
    }

    fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            guid: row.get(1)?,
            title: row.get(2)?,
            audio_url: row.get(3)?,
            duration: row.get(4)?,
            published_date: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.guid, p.title, p.duration, p.published_date,
                    (SELECT COUNT(*) FROM transcript_segments s WHERE s.post_id = p.id),
                    (SELECT COUNT(*) FROM segment_overrides o
                      WHERE o.post_id = p.id AND o.user_approved = 1),
                    EXISTS(SELECT 1 FROM processing_jobs j
                            WHERE j.post_guid = p.guid AND j.status = 'pending_review')
             FROM posts p
             ORDER BY p.published_date DESC, p.id DESC",
        )?;
        let posts = stmt
            .query_map([], |row| {
                Ok(PostSummary {
                    id: row.get(0)?,
                    guid: row.get(1)?,
                    title: row.get(2)?,
                    duration: row.get(3)?,
                    published_date: row.get(4)?,
                    segment_count: row.get(5)?,
                    override_count: row.get(6)?,
                    pending_review: row.get::<_, i32>(7)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    // =========================================================================
    // Transcript segment queries
    // =========================================================================

    /// Replace the transcript of a post, assigning sequence numbers from
    /// slice order. The transcription stage calls this once per episode;
    /// segments are immutable afterwards.
    pub fn replace_transcript_segments(
        &self,
        post_id: i64,
        segments: &[NewTranscriptSegment],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM transcript_segments WHERE post_id = ?",
            params![post_id],
        )?;

        for (idx, segment) in segments.iter().enumerate() {
            tx.execute(
                "INSERT INTO transcript_segments (post_id, sequence_num, start_time, end_time, text)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    post_id,
                    idx as i32,
                    segment.start_time,
                    segment.end_time,
                    segment.text
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_transcript_segments(&self, post_id: i64) -> Result<Vec<TranscriptSegment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, post_id, sequence_num, start_time, end_time, text
             FROM transcript_segments
             WHERE post_id = ?
             ORDER BY sequence_num",
        )?;
        let segments = stmt
            .query_map(params![post_id], |row| {
                Ok(TranscriptSegment {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    sequence_num: row.get(2)?,
                    start_time: row.get(3)?,
                    end_time: row.get(4)?,
                    text: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(segments)
    }

    // =========================================================================
    // Identification queries
    // =========================================================================

    pub fn insert_identification(
        &self,
        transcript_segment_id: i64,
        label: &str,
        confidence: f64,
        model_used: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO identifications (transcript_segment_id, label, confidence, model_used)
             VALUES (?, ?, ?, ?)",
            params![transcript_segment_id, label, confidence, model_used],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All segments of a post labeled `ad`, in transcript order, one row per
    /// segment. Duplicate identifications for the same segment are collapsed
    /// by keeping the highest confidence, then the lowest identification id.
    pub fn get_ad_segments(&self, post_id: i64) -> Result<Vec<AdSegment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.sequence_num, s.start_time, s.end_time, s.text, i.confidence
             FROM identifications i
             JOIN transcript_segments s ON i.transcript_segment_id = s.id
             WHERE s.post_id = ? AND i.label = 'ad'
             ORDER BY s.sequence_num, i.confidence DESC, i.id",
        )?;
        let rows = stmt
            .query_map(params![post_id], |row| {
                Ok(AdSegment {
                    id: row.get(0)?,
                    sequence_num: row.get(1)?,
                    start_time: row.get(2)?,
                    end_time: row.get(3)?,
                    text: row.get(4)?,
                    confidence: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut segments: Vec<AdSegment> = Vec::with_capacity(rows.len());
        let mut seen_segment_ids = std::collections::HashSet::new();
        for segment in rows {
            if seen_segment_ids.insert(segment.id) {
                segments.push(segment);
            }
        }

        Ok(segments)
    }

    /// Every transcript segment of a post with its label, in sequence order.
    /// Segments without an identification come back labeled `unknown` with
    /// confidence 0.0; duplicate identifications collapse with the same
    /// tie-break as `get_ad_segments`.
    pub fn get_labeled_transcript(&self, post_id: i64) -> Result<Vec<LabeledSegment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.sequence_num, s.start_time, s.end_time, s.text,
                    i.label, i.confidence
             FROM transcript_segments s
             LEFT JOIN identifications i ON i.transcript_segment_id = s.id
             WHERE s.post_id = ?
             ORDER BY s.sequence_num, i.confidence DESC, i.id",
        )?;
        let rows = stmt
            .query_map(params![post_id], |row| {
                Ok(LabeledSegment {
                    id: row.get(0)?,
                    sequence_num: row.get(1)?,
                    start_time: row.get(2)?,
                    end_time: row.get(3)?,
                    text: row.get(4)?,
                    label: row
                        .get::<_, Option<String>>(5)?
                        .unwrap_or_else(|| "unknown".to_string()),
                    confidence: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut segments: Vec<LabeledSegment> = Vec::with_capacity(rows.len());
        let mut seen_segment_ids = std::collections::HashSet::new();
        for segment in rows {
            if seen_segment_ids.insert(segment.id) {
                segments.push(segment);
            }
        }

        Ok(segments)
    }

    // =========================================================================
    // Segment override queries
    // =========================================================================

    /// Replace all overrides for a post in one transaction. Every existing
    /// row is deleted unconditionally (an empty input clears the post), then
    /// one row is inserted per approved item. Returns the inserted count.
    pub fn replace_overrides(&self, post_id: i64, overrides: &[OverrideRange]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM segment_overrides WHERE post_id = ?",
            params![post_id],
        )?;

        let mut inserted = 0usize;
        for range in overrides {
            if range.is_approved() {
                tx.execute(
                    "INSERT INTO segment_overrides (post_id, start_time, end_time, user_approved)
                     VALUES (?, ?, ?, 1)",
                    params![post_id, range.start_time, range.end_time],
                )?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Approved overrides for a post in insertion order.
    pub fn get_approved_overrides(&self, post_id: i64) -> Result<Vec<SegmentOverride>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, post_id, start_time, end_time, user_approved, created_at
             FROM segment_overrides
             WHERE post_id = ? AND user_approved = 1
             ORDER BY id",
        )?;
        let overrides = stmt
            .query_map(params![post_id], |row| {
                Ok(SegmentOverride {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    start_time: row.get(2)?,
                    end_time: row.get(3)?,
                    user_approved: row.get::<_, i32>(4)? == 1,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(overrides)
    }

    // =========================================================================
    // Processing job queries
    // =========================================================================

    pub fn create_job(&self, post_guid: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO processing_jobs (post_guid, status, created_at) VALUES (?, 'pending', ?)",
            params![post_guid, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_job_status(&self, job_id: i64, status: &JobStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        match status {
            JobStatus::Processing => conn.execute(
                "UPDATE processing_jobs SET status = ?, started_at = datetime('now') WHERE id = ?",
                params![status.to_string(), job_id],
            )?,
            JobStatus::Completed | JobStatus::Failed => conn.execute(
                "UPDATE processing_jobs SET status = ?, completed_at = datetime('now') WHERE id = ?",
                params![status.to_string(), job_id],
            )?,
            _ => conn.execute(
                "UPDATE processing_jobs SET status = ? WHERE id = ?",
                params![status.to_string(), job_id],
            )?,
        };
        Ok(())
    }

    pub fn fail_job(&self, job_id: i64, error: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE processing_jobs
             SET status = 'failed', error_message = ?, completed_at = datetime('now')
             WHERE id = ?",
            params![error, job_id],
        )?;
        Ok(())
    }

    /// Newest job awaiting human review for a post, if any.
    pub fn find_pending_review_job(&self, post_guid: &str) -> Result<Option<ProcessingJob>> {
        let conn = self.conn.lock().unwrap();
        let job = conn
            .query_row(
                "SELECT id, post_guid, status, current_step, total_steps, segments_approved,
                        error_message, created_at, started_at, completed_at
                 FROM processing_jobs
                 WHERE post_guid = ? AND status = 'pending_review'
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                params![post_guid],
                Self::map_job,
            )
            .optional()?;
        Ok(job)
    }

    pub fn get_job(&self, job_id: i64) -> Result<Option<ProcessingJob>> {
        let conn = self.conn.lock().unwrap();
        let job = conn
            .query_row(
                "SELECT id, post_guid, status, current_step, total_steps, segments_approved,
                        error_message, created_at, started_at, completed_at
                 FROM processing_jobs WHERE id = ?",
                params![job_id],
                Self::map_job,
            )
            .optional()?;
        Ok(job)
    }

    fn map_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcessingJob> {
        Ok(ProcessingJob {
            id: row.get(0)?,
            post_guid: row.get(1)?,
            status: row.get::<_, String>(2)?.into(),
            current_step: row.get(3)?,
            total_steps: row.get(4)?,
            segments_approved: row.get::<_, i32>(5)? == 1,
            error_message: row.get(6)?,
            created_at: row.get(7)?,
            started_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }

    pub fn mark_segments_approved(&self, job_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE processing_jobs SET segments_approved = 1 WHERE id = ?",
            params![job_id],
        )?;
        Ok(())
    }

    pub fn count_posts(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count)
    }
}

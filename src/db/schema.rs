pub const SCHEMA: &str = r#"
-- saved_summaries table (append-only; rows leave only through explicit delete)
CREATE TABLE IF NOT EXISTS saved_summaries (
    id TEXT PRIMARY KEY,
    video_url TEXT NOT NULL,
    title TEXT NOT NULL,
    thumbnail_url TEXT,
    summary TEXT NOT NULL,
    provenance TEXT NOT NULL,
    mode TEXT NOT NULL DEFAULT 'all',
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_saved_summaries_created_at ON saved_summaries(created_at DESC);
"#;

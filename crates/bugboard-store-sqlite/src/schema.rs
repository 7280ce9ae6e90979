//! SQL schema for the board's SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Only SHA-256 digests of issued tokens are stored.
CREATE TABLE IF NOT EXISTS tokens (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

-- owner_id is written by INSERT only; no UPDATE statement touches it.
CREATE TABLE IF NOT EXISTS posts (
    post_id     TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS solutions (
    solution_id TEXT PRIMARY KEY,
    post_id     TEXT NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    owner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  TEXT PRIMARY KEY,
    solution_id TEXT NOT NULL REFERENCES solutions(solution_id) ON DELETE CASCADE,
    owner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id TEXT PRIMARY KEY,
    name   TEXT NOT NULL UNIQUE,
    slug   TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS post_tags (
    post_id TEXT NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    tag_id  TEXT NOT NULL REFERENCES tags(tag_id)   ON DELETE CASCADE,
    PRIMARY KEY (post_id, tag_id)
);

-- The primary key is the (voter, solution) uniqueness slot.
-- Rows are inserted and deleted, never updated.
CREATE TABLE IF NOT EXISTS votes (
    voter_id    TEXT NOT NULL REFERENCES users(user_id)         ON DELETE CASCADE,
    solution_id TEXT NOT NULL REFERENCES solutions(solution_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (voter_id, solution_id)
);

CREATE INDEX IF NOT EXISTS tokens_user_idx        ON tokens(user_id);
CREATE INDEX IF NOT EXISTS solutions_post_idx     ON solutions(post_id);
CREATE INDEX IF NOT EXISTS comments_solution_idx  ON comments(solution_id);
CREATE INDEX IF NOT EXISTS post_tags_tag_idx      ON post_tags(tag_id);
CREATE INDEX IF NOT EXISTS votes_solution_idx     ON votes(solution_id);

PRAGMA user_version = 1;
";

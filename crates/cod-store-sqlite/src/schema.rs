//! SQL schema for the dashboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS orders (
    order_id          TEXT PRIMARY KEY,
    tracking_id       TEXT,
    assigned_courier  TEXT,
    customer_name     TEXT NOT NULL,
    customer_address  TEXT NOT NULL,
    customer_email    TEXT NOT NULL,
    customer_phone    TEXT NOT NULL,
    total_price       REAL NOT NULL,
    status            TEXT NOT NULL,   -- 'confirmed' | 'pending' | 'unconfirmed'
    created_date      TEXT NOT NULL    -- RFC 3339 UTC, fixed width
);

-- Order history is strictly append-only.
-- No UPDATE is ever issued against this table; seq is insertion order.
CREATE TABLE IF NOT EXISTS order_history (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id    TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
    entry_type  TEXT NOT NULL,
    content     TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    status      TEXT
);

CREATE TABLE IF NOT EXISTS deliveries (
    tracking          TEXT PRIMARY KEY,
    customer_name     TEXT NOT NULL,
    customer_phone    TEXT NOT NULL,
    customer_address  TEXT NOT NULL,
    merchant          TEXT NOT NULL,
    order_status      TEXT NOT NULL,   -- free-text courier status
    no_of_items       INTEGER NOT NULL,
    courier           TEXT NOT NULL,   -- lower-case courier key
    city              TEXT NOT NULL,
    order_value       INTEGER NOT NULL,
    created_date      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fake_orders (
    order_id               TEXT PRIMARY KEY,
    customer               TEXT NOT NULL,
    phone                  TEXT NOT NULL,
    address                TEXT NOT NULL,
    amount                 REAL NOT NULL,
    status                 TEXT NOT NULL,
    suspicious             INTEGER NOT NULL,
    flag_count             INTEGER NOT NULL,
    order_history          TEXT NOT NULL DEFAULT '[]',   -- JSON array of notes
    verification_required  INTEGER NOT NULL,
    date                   TEXT NOT NULL,
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fake_order_messages (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id    TEXT NOT NULL REFERENCES fake_orders(order_id) ON DELETE CASCADE,
    message_id  TEXT NOT NULL,
    text        TEXT NOT NULL,
    sender      TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS high_risk_orders (
    order_id      TEXT PRIMARY KEY,
    customer      TEXT NOT NULL,
    area          TEXT NOT NULL,
    address       TEXT NOT NULL,
    risk_rate     INTEGER NOT NULL CHECK (risk_rate BETWEEN 0 AND 100),
    risk_factors  TEXT NOT NULL DEFAULT '[]',   -- JSON array
    status        TEXT NOT NULL,
    date          TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS high_risk_messages (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id    TEXT NOT NULL REFERENCES high_risk_orders(order_id) ON DELETE CASCADE,
    message_id  TEXT NOT NULL,
    text        TEXT NOT NULL,
    sender      TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    role           TEXT NOT NULL DEFAULT 'user',
    password_hash  TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_created_idx        ON orders(created_date);
CREATE INDEX IF NOT EXISTS orders_status_idx         ON orders(status);
CREATE INDEX IF NOT EXISTS order_history_order_idx   ON order_history(order_id);
CREATE INDEX IF NOT EXISTS deliveries_courier_idx    ON deliveries(courier);
CREATE INDEX IF NOT EXISTS fake_orders_date_idx      ON fake_orders(date);
CREATE INDEX IF NOT EXISTS fake_messages_order_idx   ON fake_order_messages(order_id);
CREATE INDEX IF NOT EXISTS high_risk_date_idx        ON high_risk_orders(date);
CREATE INDEX IF NOT EXISTS high_risk_messages_idx    ON high_risk_messages(order_id);

PRAGMA user_version = 1;
";

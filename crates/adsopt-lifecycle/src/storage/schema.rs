//! Schema SQL constants, used by migrations.rs.

/// V1: lifecycle records, validation catalog and daily spend aggregates.
pub const LIFECYCLE_TABLES_V1: &str = "
    CREATE TABLE IF NOT EXISTS experiments (
        experiment_id TEXT PRIMARY KEY NOT NULL,
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT,
        name TEXT NOT NULL,
        objective TEXT NOT NULL,
        hypothesis TEXT,
        guardrails TEXT NOT NULL DEFAULT 'null',
        evaluation_lag_days INTEGER,
        evaluation_window_days INTEGER,
        scope TEXT NOT NULL DEFAULT '{}',
        scope_version INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS change_log (
        change_id TEXT PRIMARY KEY NOT NULL,
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        occurred_at TEXT NOT NULL,
        channel TEXT NOT NULL,
        change_type TEXT NOT NULL,
        summary TEXT,
        validated_snapshot_date TEXT,
        experiment_id TEXT,
        run_id TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS change_entity_links (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        change_id TEXT NOT NULL REFERENCES change_log(change_id) ON DELETE CASCADE,
        entity_type TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        field TEXT,
        before_json TEXT NOT NULL DEFAULT 'null',
        after_json TEXT NOT NULL DEFAULT 'null'
    ) STRICT;

    CREATE TABLE IF NOT EXISTS experiment_events (
        event_id TEXT PRIMARY KEY NOT NULL,
        experiment_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        occurred_at TEXT NOT NULL,
        run_id TEXT,
        note TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS kiv_items (
        kiv_id TEXT PRIMARY KEY NOT NULL,
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT NOT NULL,
        title TEXT NOT NULL,
        details TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        resolved_at TEXT,
        source_experiment_id TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS driver_campaign_intents (
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        intent TEXT NOT NULL,
        notes TEXT,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (account_id, marketplace, asin, campaign_id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS entities (
        kind TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT,
        campaign_id TEXT,
        name TEXT,
        PRIMARY KEY (kind, entity_id, account_id, marketplace)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS campaign_spend_daily (
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT NOT NULL,
        channel TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        campaign_name TEXT,
        date TEXT NOT NULL,
        spend REAL NOT NULL DEFAULT 0.0,
        sales REAL NOT NULL DEFAULT 0.0,
        PRIMARY KEY (account_id, marketplace, asin, channel, campaign_id, date)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS target_spend_daily (
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        ad_group_id TEXT,
        target_id TEXT NOT NULL,
        target_text TEXT,
        date TEXT NOT NULL,
        spend REAL NOT NULL DEFAULT 0.0,
        sales REAL NOT NULL DEFAULT 0.0,
        PRIMARY KEY (account_id, marketplace, asin, target_id, date)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS spend_reconciliation_daily (
        account_id TEXT NOT NULL,
        marketplace TEXT NOT NULL,
        asin TEXT NOT NULL,
        date TEXT NOT NULL,
        reported_cost REAL NOT NULL DEFAULT 0.0,
        attributed_spend REAL NOT NULL DEFAULT 0.0,
        advertised_spend REAL NOT NULL DEFAULT 0.0,
        brand_attributed_spend REAL NOT NULL DEFAULT 0.0,
        PRIMARY KEY (account_id, marketplace, asin, date)
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_experiments_account ON experiments(account_id, marketplace);
    CREATE INDEX IF NOT EXISTS idx_change_log_experiment ON change_log(experiment_id, occurred_at);
    CREATE INDEX IF NOT EXISTS idx_change_links_change ON change_entity_links(change_id);
    CREATE INDEX IF NOT EXISTS idx_events_experiment ON experiment_events(experiment_id, occurred_at);
    CREATE INDEX IF NOT EXISTS idx_kiv_scope ON kiv_items(account_id, marketplace, asin);
    CREATE INDEX IF NOT EXISTS idx_entities_lookup ON entities(kind, entity_id);
";

/// Tables created by V1, for health checks and tests.
pub const LIFECYCLE_TABLE_NAMES: [&str; 10] = [
    "experiments",
    "change_log",
    "change_entity_links",
    "experiment_events",
    "kiv_items",
    "driver_campaign_intents",
    "entities",
    "campaign_spend_daily",
    "target_spend_daily",
    "spend_reconciliation_daily",
];

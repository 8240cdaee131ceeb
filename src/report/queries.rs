//! Catalog queries. Every identifier comes in through a bind parameter;
//! `$1` is always the schema name and `$2` the table name.
//! Catalog domains are cast to `text` so they decode as plain strings.

pub const LIST_TABLES: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1
    ORDER BY table_name
"#;

pub const COLUMNS: &str = r#"
    SELECT
        column_name::text AS column_name,
        data_type::text AS data_type,
        is_nullable::text AS is_nullable,
        column_default::text AS column_default
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    ORDER BY ordinal_position
"#;

pub const INDEXES: &str = r#"
    SELECT
        indexname::text AS indexname,
        indexdef
    FROM pg_indexes
    WHERE schemaname = $1 AND tablename = $2
    ORDER BY indexname
"#;

/// One row per referencing column. Local and referenced columns are paired
/// by their position in the constraint, and rows are keyed on the constraint
/// itself, so repeated constraint names and composite keys stay distinct.
pub const FOREIGN_KEYS: &str = r#"
    SELECT
        con.conname::text AS constraint_name,
        att.attname::text AS column_name,
        ref_cls.relname::text AS foreign_table_name,
        ref_att.attname::text AS foreign_column_name
    FROM pg_constraint AS con
    JOIN pg_class AS cls ON cls.oid = con.conrelid
    JOIN pg_namespace AS nsp ON nsp.oid = cls.relnamespace
    JOIN pg_class AS ref_cls ON ref_cls.oid = con.confrelid
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
        WITH ORDINALITY AS cols (attnum, ref_attnum, position)
    JOIN pg_attribute AS att
        ON att.attrelid = con.conrelid AND att.attnum = cols.attnum
    JOIN pg_attribute AS ref_att
        ON ref_att.attrelid = con.confrelid AND ref_att.attnum = cols.ref_attnum
    WHERE nsp.nspname = $1
        AND cls.relname = $2
        AND con.contype = 'f'
    ORDER BY con.conname, cols.position
"#;

pub const STATS: &str = r#"
    SELECT
        (SELECT count(*) FROM information_schema.tables WHERE table_schema = $1) AS total_tables,
        (SELECT count(*) FROM information_schema.views WHERE table_schema = $1) AS total_views,
        (SELECT count(*) FROM information_schema.routines WHERE routine_schema = $1) AS total_functions
"#;

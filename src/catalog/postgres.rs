use crate::catalog::{read_catalog, CatalogSource};
use crate::error::{ExportError, ExportResult};
use crate::types::{CatalogRows, ColumnDescriptor, ForeignKeyEdge, PrimaryKeyColumn};
use tokio::task::JoinHandle;
use tokio_postgres::config::Host;
use tokio_postgres::{Client, Config, NoTls, Row};
use tracing::{debug, info};

//language=postgresql
const COLUMNS_QUERY: &str = r#"
select t.table_schema::text,
       t.table_name::text,
       c.column_name::text,
       case
           when c.data_type in ('USER-DEFINED', 'ARRAY') then c.udt_name::text
           else c.data_type::text
           end                                   as data_type,
       c.character_maximum_length::int4,
       case
           when c.data_type in ('numeric', 'decimal') then c.numeric_precision::int4
           end                                   as numeric_precision,
       case
           when c.data_type in ('numeric', 'decimal') then c.numeric_scale::int4
           end                                   as numeric_scale,
       c.is_nullable = 'YES'                     as is_nullable,
       c.column_default::text
from information_schema.tables t
         join information_schema.columns c
              on t.table_schema = c.table_schema
                  and t.table_name = c.table_name
where t.table_type = 'BASE TABLE'
  and t.table_schema not in ('pg_catalog', 'information_schema')
order by t.table_schema, t.table_name, c.ordinal_position;
"#;

//language=postgresql
const PRIMARY_KEYS_QUERY: &str = r#"
select ku.table_schema::text,
       ku.table_name::text,
       ku.column_name::text,
       ku.ordinal_position::int4
from information_schema.table_constraints tc
         join information_schema.key_column_usage ku
              on tc.constraint_name = ku.constraint_name
                  and tc.table_name = ku.table_name
                  and tc.table_schema = ku.table_schema
where tc.constraint_type = 'PRIMARY KEY'
order by ku.table_schema, ku.table_name, ku.ordinal_position;
"#;

//language=postgresql
const FOREIGN_KEYS_QUERY: &str = r#"
select con.conname::text        as constraint_name,
       src_ns.nspname::text     as source_schema,
       src.relname::text        as source_table,
       src_attr.attname::text   as source_column,
       ref_ns.nspname::text     as referenced_schema,
       ref.relname::text        as referenced_table,
       ref_attr.attname::text   as referenced_column
from pg_constraint con
         join pg_class src on src.oid = con.conrelid
         join pg_namespace src_ns on src_ns.oid = src.relnamespace
         join pg_class ref on ref.oid = con.confrelid
         join pg_namespace ref_ns on ref_ns.oid = ref.relnamespace
         join unnest(con.conkey, con.confkey) with ordinality as cols (conkey, confkey, position) on true
         join pg_attribute src_attr on src_attr.attrelid = con.conrelid and src_attr.attnum = cols.conkey
         join pg_attribute ref_attr on ref_attr.attrelid = con.confrelid and ref_attr.attnum = cols.confkey
where con.contype = 'f'
order by src_ns.nspname, src.relname, con.conname, cols.position;
"#;

/// Catalog reader over a single live PostgreSQL connection.
///
/// The connection is opened by [`PostgresCatalog::connect`] and must be
/// released with [`PostgresCatalog::close`] once the caller is done with it.
pub struct PostgresCatalog {
    client: Client,
    join_handle: JoinHandle<Result<(), tokio_postgres::Error>>,
    source: String,
}

impl PostgresCatalog {
    pub async fn connect(connection_string: &str) -> ExportResult<Self> {
        let config: Config = connection_string.parse().map_err(|e| {
            ExportError::configuration(format!("Invalid database connection string: {}", e))
        })?;
        let source = describe_config(&config);

        debug!(source = %source, "Connecting to database");
        let (client, connection) = config.connect(NoTls).await?;

        // The connection object performs the actual communication with the database,
        // so spawn it off to run on its own.
        let join_handle = tokio::spawn(connection);

        info!(source = %source, "Connected to database");

        Ok(Self {
            client,
            join_handle,
            source,
        })
    }

    /// Host and database name, without credentials
    pub fn source(&self) -> &str {
        &self.source
    }

    pub async fn server_version(&self) -> ExportResult<String> {
        let query = "select version()";
        let row = self
            .client
            .query_one(query, &[])
            .await
            .map_err(|e| ExportError::query(query, e))?;

        Ok(row.try_get(0)?)
    }

    /// Drop the client and wait for the connection task to wind down.
    pub async fn close(self) -> ExportResult<()> {
        let Self {
            client,
            join_handle,
            source,
        } = self;
        drop(client);

        match join_handle.await {
            Ok(result) => {
                result?;
                debug!(source = %source, "Database connection closed");
                Ok(())
            }
            Err(e) => Err(ExportError::catalog(format!(
                "Connection task for {} ended abnormally: {}",
                source, e
            ))),
        }
    }

    /// Close the connection, then hand back `result`.
    ///
    /// The close happens whether or not `result` is an error; an error in
    /// `result` wins over a failure to close.
    pub async fn finish<T>(self, result: ExportResult<T>) -> ExportResult<T> {
        let closed = self.close().await;

        let value = result?;
        closed?;
        Ok(value)
    }

    async fn get_results<T>(&self, query: &str, from_row: fn(&Row) -> ExportResult<T>) -> ExportResult<Vec<T>> {
        let rows = self
            .client
            .query(query, &[])
            .await
            .map_err(|e| ExportError::query(query, e))?;

        rows.iter().map(from_row).collect()
    }
}

/// Read the whole catalog over one short-lived connection.
///
/// Returns the credential-free source label along with the rows.
pub async fn fetch_catalog(connection_string: &str) -> ExportResult<(String, CatalogRows)> {
    let catalog = PostgresCatalog::connect(connection_string).await?;
    let source = catalog.source().to_string();
    let rows = read_catalog(&catalog).await;

    let rows = catalog.finish(rows).await?;
    Ok((source, rows))
}

pub async fn fetch_server_version(connection_string: &str) -> ExportResult<String> {
    let catalog = PostgresCatalog::connect(connection_string).await?;
    let version = catalog.server_version().await;
    catalog.finish(version).await
}

impl CatalogSource for PostgresCatalog {
    async fn read_columns(&self) -> ExportResult<Vec<ColumnDescriptor>> {
        self.get_results(COLUMNS_QUERY, column_from_row).await
    }

    async fn read_primary_keys(&self) -> ExportResult<Vec<PrimaryKeyColumn>> {
        self.get_results(PRIMARY_KEYS_QUERY, primary_key_from_row).await
    }

    async fn read_foreign_keys(&self) -> ExportResult<Vec<ForeignKeyEdge>> {
        self.get_results(FOREIGN_KEYS_QUERY, foreign_key_from_row).await
    }
}

fn column_from_row(row: &Row) -> ExportResult<ColumnDescriptor> {
    Ok(ColumnDescriptor {
        schema: row.try_get(0)?,
        table: row.try_get(1)?,
        column: row.try_get(2)?,
        data_type: row.try_get(3)?,
        character_maximum_length: row.try_get(4)?,
        numeric_precision: row.try_get(5)?,
        numeric_scale: row.try_get(6)?,
        is_nullable: row.try_get(7)?,
        column_default: row.try_get(8)?,
    })
}

fn primary_key_from_row(row: &Row) -> ExportResult<PrimaryKeyColumn> {
    Ok(PrimaryKeyColumn {
        schema: row.try_get(0)?,
        table: row.try_get(1)?,
        column: row.try_get(2)?,
        ordinal_position: row.try_get(3)?,
    })
}

fn foreign_key_from_row(row: &Row) -> ExportResult<ForeignKeyEdge> {
    Ok(ForeignKeyEdge {
        constraint_name: row.try_get(0)?,
        source_schema: row.try_get(1)?,
        source_table: row.try_get(2)?,
        source_column: row.try_get(3)?,
        referenced_schema: row.try_get(4)?,
        referenced_table: row.try_get(5)?,
        referenced_column: row.try_get(6)?,
    })
}

fn describe_config(config: &Config) -> String {
    let hosts = config
        .get_hosts()
        .iter()
        .map(|host| match host {
            Host::Tcp(name) => name.clone(),
            #[cfg(unix)]
            Host::Unix(path) => path.display().to_string(),
        })
        .collect::<Vec<_>>();

    let host = if hosts.is_empty() {
        "localhost".to_string()
    } else {
        hosts.join(",")
    };

    match config.get_dbname() {
        Some(db) => format!("{}/{}", host, db),
        None => host,
    }
}

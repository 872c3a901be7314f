use super::*;
use crate::types::*;
use indoc::indoc;

/// Helper function to create a test column
fn column(schema: &str, table: &str, name: &str, data_type: &str) -> ColumnDescriptor {
    ColumnDescriptor {
        schema: schema.to_string(),
        table: table.to_string(),
        column: name.to_string(),
        data_type: data_type.to_string(),
        character_maximum_length: None,
        numeric_precision: None,
        numeric_scale: None,
        is_nullable: false,
        column_default: None,
    }
}

fn key_column(schema: &str, table: &str, name: &str, ordinal_position: i32) -> PrimaryKeyColumn {
    PrimaryKeyColumn {
        schema: schema.to_string(),
        table: table.to_string(),
        column: name.to_string(),
        ordinal_position,
    }
}

fn edge(name: &str, source: (&str, &str, &str), referenced: (&str, &str, &str)) -> ForeignKeyEdge {
    ForeignKeyEdge {
        constraint_name: name.to_string(),
        source_schema: source.0.to_string(),
        source_table: source.1.to_string(),
        source_column: source.2.to_string(),
        referenced_schema: referenced.0.to_string(),
        referenced_table: referenced.1.to_string(),
        referenced_column: referenced.2.to_string(),
    }
}

/// Two related tables: Threads references Regions
fn forum_rows() -> CatalogRows {
    let mut region_name = column("dbo", "Regions", "Name", "nvarchar");
    region_name.character_maximum_length = Some(100);

    let mut thread_body = column("dbo", "Threads", "Body", "nvarchar");
    thread_body.character_maximum_length = Some(-1);
    thread_body.is_nullable = true;

    let mut thread_created = column("dbo", "Threads", "CreatedAt", "datetime2");
    thread_created.column_default = Some(" (getdate()) ".to_string());

    CatalogRows {
        columns: vec![
            column("dbo", "Regions", "RegionID", "int"),
            region_name,
            column("dbo", "Threads", "ThreadID", "int"),
            column("dbo", "Threads", "RegionID", "int"),
            thread_body,
            thread_created,
        ],
        primary_keys: vec![
            key_column("dbo", "Regions", "RegionID", 1),
            key_column("dbo", "Threads", "ThreadID", 1),
        ],
        foreign_keys: vec![edge(
            "FK_Threads_Regions",
            ("dbo", "Threads", "RegionID"),
            ("dbo", "Regions", "RegionID"),
        )],
    }
}

#[cfg(test)]
mod type_renderer_tests {
    use super::*;

    #[test]
    fn test_unbounded_length_renders_max() {
        let mut col = column("dbo", "Posts", "Body", "nvarchar");
        col.character_maximum_length = Some(UNBOUNDED_LENGTH);

        assert_eq!(render_type(&col), "nvarchar(MAX)");
        assert_eq!(type_qualifier(&col), Some(TypeQualifier::MaxLength));
    }

    #[test]
    fn test_bounded_length_renders_value() {
        let mut col = column("dbo", "Users", "Username", "varchar");
        col.character_maximum_length = Some(50);

        assert_eq!(render_type(&col), "varchar(50)");
    }

    #[test]
    fn test_precision_and_scale() {
        let mut col = column("dbo", "Items", "Price", "decimal");
        col.numeric_precision = Some(10);
        col.numeric_scale = Some(2);

        assert_eq!(render_type(&col), "decimal(10,2)");
    }

    #[test]
    fn test_precision_without_scale() {
        let mut col = column("dbo", "Items", "Weight", "float");
        col.numeric_precision = Some(10);

        assert_eq!(render_type(&col), "float(10)");
    }

    #[test]
    fn test_zero_scale_is_still_rendered() {
        let mut col = column("dbo", "Items", "Count", "numeric");
        col.numeric_precision = Some(18);
        col.numeric_scale = Some(0);

        assert_eq!(render_type(&col), "numeric(18,0)");
    }

    #[test]
    fn test_bare_type_without_metadata() {
        let col = column("dbo", "Users", "IsActive", "bit");

        assert_eq!(render_type(&col), "bit");
        assert_eq!(type_qualifier(&col), None);
    }

    #[test]
    fn test_character_length_wins_over_precision() {
        let mut col = column("dbo", "Odd", "Value", "nchar");
        col.character_maximum_length = Some(8);
        col.numeric_precision = Some(10);
        col.numeric_scale = Some(2);

        assert_eq!(render_type(&col), "nchar(8)");
    }

    #[test]
    fn test_zero_metadata_counts_as_absent() {
        let mut col = column("dbo", "Odd", "Flag", "bit");
        col.character_maximum_length = Some(0);
        col.numeric_precision = Some(0);

        assert_eq!(render_type(&col), "bit");
    }
}

#[cfg(test)]
mod relation_builder_tests {
    use super::*;

    #[test]
    fn test_tables_keep_first_seen_order() {
        let rows = CatalogRows {
            columns: vec![
                column("dbo", "Zebra", "ID", "int"),
                column("dbo", "Apple", "ID", "int"),
                column("audit", "Log", "ID", "int"),
            ],
            ..Default::default()
        };

        let relations = build_relations(rows);

        let names: Vec<String> = relations.tables().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(names, vec!["dbo.Zebra", "dbo.Apple", "audit.Log"]);
    }

    #[test]
    fn test_columns_grouped_in_catalog_order() {
        let relations = build_relations(forum_rows());

        assert_eq!(relations.len(), 2);
        let threads = relations.table(&TableId::new("dbo", "Threads")).unwrap();
        let names: Vec<&str> = threads.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(names, vec!["ThreadID", "RegionID", "Body", "CreatedAt"]);
    }

    #[test]
    fn test_same_table_name_in_different_schemas_stays_separate() {
        let rows = CatalogRows {
            columns: vec![
                column("dbo", "Log", "ID", "int"),
                column("audit", "Log", "ID", "int"),
                column("audit", "Log", "Message", "nvarchar"),
            ],
            ..Default::default()
        };

        let relations = build_relations(rows);

        assert_eq!(relations.len(), 2);
        assert_eq!(relations.table(&TableId::new("dbo", "Log")).unwrap().columns.len(), 1);
        assert_eq!(relations.table(&TableId::new("audit", "Log")).unwrap().columns.len(), 2);
    }

    #[test]
    fn test_primary_key_sorted_by_ordinal() {
        let rows = CatalogRows {
            columns: vec![
                column("dbo", "CharacterSkills", "CharacterID", "int"),
                column("dbo", "CharacterSkills", "SkillID", "int"),
                column("dbo", "CharacterSkills", "Season", "int"),
            ],
            primary_keys: vec![
                key_column("dbo", "CharacterSkills", "Season", 3),
                key_column("dbo", "CharacterSkills", "CharacterID", 1),
                key_column("dbo", "CharacterSkills", "SkillID", 2),
            ],
            foreign_keys: vec![],
        };

        let relations = build_relations(rows);

        let key: Vec<&str> = relations
            .primary_key(&TableId::new("dbo", "CharacterSkills"))
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(key, vec!["CharacterID", "SkillID", "Season"]);
    }

    #[test]
    fn test_orphaned_constraints_are_dropped() {
        let mut rows = forum_rows();
        rows.primary_keys.push(key_column("dbo", "Vanished", "ID", 1));
        rows.foreign_keys.push(edge(
            "FK_Vanished_Regions",
            ("dbo", "Vanished", "RegionID"),
            ("dbo", "Regions", "RegionID"),
        ));

        let relations = build_relations(rows);

        assert_eq!(relations.len(), 2);
        assert!(relations.table(&TableId::new("dbo", "Vanished")).is_none());
        assert_eq!(relations.dropped_primary_key_columns(), 1);
        assert_eq!(relations.dropped_foreign_key_edges(), 1);
    }

    #[test]
    fn test_missing_lookups_are_empty() {
        let rows = CatalogRows {
            columns: vec![column("dbo", "Settings", "Name", "nvarchar")],
            ..Default::default()
        };

        let relations = build_relations(rows);
        let id = TableId::new("dbo", "Settings");

        assert!(relations.primary_key(&id).is_empty());
        assert!(relations.foreign_keys(&id).is_empty());
        assert!(!relations.table(&id).unwrap().has_primary_key());
        assert!(relations.primary_key(&TableId::new("dbo", "Nope")).is_empty());
    }

    #[test]
    fn test_empty_catalog() {
        let relations = build_relations(CatalogRows::default());

        assert!(relations.is_empty());
        assert_eq!(relations.dropped_foreign_key_edges(), 0);
    }
}

#[cfg(test)]
mod synthesizer_tests {
    use super::*;

    #[test]
    fn test_pack_table_end_to_end() {
        let mut name = column("dbo", "Pack", "Name", "nvarchar");
        name.character_maximum_length = Some(100);
        name.is_nullable = true;

        let relations = build_relations(CatalogRows {
            columns: vec![column("dbo", "Pack", "PackID", "int"), name],
            primary_keys: vec![key_column("dbo", "Pack", "PackID", 1)],
            foreign_keys: vec![],
        });

        let ddl = render_create_table(&relations.tables()[0]);

        assert_eq!(
            ddl,
            indoc! {"
                -- dbo.Pack
                CREATE TABLE dbo.Pack (
                    PackID int NOT NULL,
                    Name nvarchar(100) NULL,
                    CONSTRAINT PK_Pack PRIMARY KEY (PackID)
                );
"}
        );
    }

    #[test]
    fn test_nullable_column_without_default() {
        let mut col = column("dbo", "Users", "Bio", "nvarchar");
        col.character_maximum_length = Some(-1);
        col.is_nullable = true;

        assert_eq!(render_column_line(&col), "    Bio nvarchar(MAX) NULL");
    }

    #[test]
    fn test_not_null_column_with_default() {
        let mut col = column("dbo", "Users", "Points", "int");
        col.column_default = Some("0".to_string());

        assert_eq!(render_column_line(&col), "    Points int NOT NULL DEFAULT 0");
    }

    #[test]
    fn test_default_is_trimmed_and_passed_through() {
        let mut col = column("dbo", "Threads", "CreatedAt", "datetime2");
        col.column_default = Some("  ((getdate()))\n".to_string());

        assert_eq!(
            render_column_line(&col),
            "    CreatedAt datetime2 NOT NULL DEFAULT ((getdate()))"
        );
    }

    #[test]
    fn test_blank_default_is_omitted() {
        let mut col = column("dbo", "Threads", "Title", "nvarchar");
        col.column_default = Some("   ".to_string());

        assert_eq!(render_column_line(&col), "    Title nvarchar NOT NULL");
    }

    #[test]
    fn test_foreign_key_only_on_referencing_table() {
        let relations = build_relations(CatalogRows {
            columns: vec![
                column("dbo", "A", "id", "int"),
                column("dbo", "B", "id", "int"),
                column("dbo", "B", "a_id", "int"),
            ],
            primary_keys: vec![],
            foreign_keys: vec![edge("FK_B_A", ("dbo", "B", "a_id"), ("dbo", "A", "id"))],
        });

        let a = render_create_table(&relations.tables()[0]);
        let b = render_create_table(&relations.tables()[1]);

        assert_eq!(a.matches("FOREIGN KEY").count(), 0);
        assert_eq!(b.matches("FOREIGN KEY").count(), 1);
        assert!(b.contains("    CONSTRAINT FK_B_A FOREIGN KEY (a_id) REFERENCES dbo.A(id)"));
    }

    #[test]
    fn test_column_lines_precede_constraints() {
        let relations = build_relations(forum_rows());
        let threads = relations.table(&TableId::new("dbo", "Threads")).unwrap();

        let ddl = render_create_table(threads);
        let body: Vec<&str> = ddl
            .lines()
            .skip(2)
            .take_while(|line| *line != ");")
            .collect();

        let first_constraint = body
            .iter()
            .position(|line| line.trim_start().starts_with("CONSTRAINT"))
            .unwrap();
        assert_eq!(first_constraint, threads.columns.len());
        assert_eq!(body.len(), threads.columns.len() + 2);
        assert!(body[first_constraint].contains("PRIMARY KEY"));
        assert!(body[first_constraint + 1].contains("FOREIGN KEY"));
    }

    #[test]
    fn test_full_statement_with_constraints() {
        let relations = build_relations(forum_rows());
        let threads = relations.table(&TableId::new("dbo", "Threads")).unwrap();

        assert_eq!(
            render_create_table(threads),
            indoc! {"
                -- dbo.Threads
                CREATE TABLE dbo.Threads (
                    ThreadID int NOT NULL,
                    RegionID int NOT NULL,
                    Body nvarchar(MAX) NULL,
                    CreatedAt datetime2 NOT NULL DEFAULT (getdate()),
                    CONSTRAINT PK_Threads PRIMARY KEY (ThreadID),
                    CONSTRAINT FK_Threads_Regions FOREIGN KEY (RegionID) REFERENCES dbo.Regions(RegionID)
                );
"}
        );
    }

    #[test]
    fn test_table_without_primary_key_has_only_columns() {
        let relations = build_relations(CatalogRows {
            columns: vec![
                column("dbo", "ActivityLog", "UserID", "int"),
                column("dbo", "ActivityLog", "Action", "nvarchar"),
            ],
            ..Default::default()
        });

        let ddl = render_create_table(&relations.tables()[0]);

        assert!(!ddl.contains("PRIMARY KEY"));
        assert!(!ddl.contains("CONSTRAINT"));
        assert!(ddl.ends_with("    Action nvarchar NOT NULL\n);\n"));
    }

    #[test]
    fn test_composite_key_in_one_clause() {
        let relations = build_relations(CatalogRows {
            columns: vec![
                column("dbo", "ThreadParticipants", "ThreadID", "int"),
                column("dbo", "ThreadParticipants", "CharacterID", "int"),
            ],
            primary_keys: vec![
                key_column("dbo", "ThreadParticipants", "CharacterID", 2),
                key_column("dbo", "ThreadParticipants", "ThreadID", 1),
            ],
            foreign_keys: vec![],
        });

        let ddl = render_create_table(&relations.tables()[0]);

        assert_eq!(ddl.matches("PRIMARY KEY").count(), 1);
        assert!(ddl.contains(
            "    CONSTRAINT PK_ThreadParticipants PRIMARY KEY (ThreadID, CharacterID)\n);"
        ));
    }

    #[test]
    fn test_composite_foreign_key_renders_one_clause_per_column() {
        let relations = build_relations(CatalogRows {
            columns: vec![
                column("dbo", "Child", "A", "int"),
                column("dbo", "Child", "B", "int"),
            ],
            primary_keys: vec![],
            foreign_keys: vec![
                edge("FK_Child_Parent", ("dbo", "Child", "A"), ("dbo", "Parent", "A")),
                edge("FK_Child_Parent", ("dbo", "Child", "B"), ("dbo", "Parent", "B")),
            ],
        });

        let ddl = render_create_table(&relations.tables()[0]);

        assert_eq!(ddl.matches("CONSTRAINT FK_Child_Parent FOREIGN KEY").count(), 2);
    }

    #[test]
    fn test_builder_skips_empty_primary_key() {
        let id = TableId::new("dbo", "Empty");
        let mut builder = CreateTableBuilder::new(&id);
        builder
            .column(&column("dbo", "Empty", "ID", "int"))
            .primary_key(&[]);

        assert_eq!(
            builder.build(),
            "-- dbo.Empty\nCREATE TABLE dbo.Empty (\n    ID int NOT NULL\n);\n"
        );
    }
}

//! Integration tests for tsqlorm against the in-memory driver
//!
//! These tests drive the public API end to end:
//! - Fetching through collections, with joins, filters and limits
//! - Mapping joined and fanned-out rows into entity graphs
//! - Inserts, updates and deletes through the entity lifecycle
//! - Transactions and error reporting

use fake::Fake;
use fake::faker::name::en::Name;
use tsqlorm::prelude::*;
use tsqlorm::schema::DeclaredSchemaSource;
use tsqlorm::testing::MemoryDriver;
use tsqlorm::MemoryRows;
use tsqlorm::error::JoinError;
use tsqlorm::error::SchemaError;

// =============================================================================
// Test Table Definitions
// =============================================================================

#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "Organisations")]
pub struct Organisation {
    #[tsqlorm(primary_key, auto_increment, column_name = "Id")]
    pub id:   i64,
    #[tsqlorm(column_name = "Name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "Users")]
pub struct User {
    #[tsqlorm(primary_key, auto_increment, column_name = "Id")]
    pub id:           i64,
    #[tsqlorm(column_name = "Name")]
    pub name:         String,
    #[tsqlorm(foreign_key, column_name = "Organisation")]
    pub organisation: Option<Organisation>,
    #[tsqlorm(many_to_many, junction = "UserRole")]
    pub roles:        Vec<Role>,
    #[tsqlorm(many_to_many, junction = "UserBadge")]
    pub badges:       Vec<Badge>,
}

#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "Roles")]
pub struct Role {
    #[tsqlorm(primary_key, auto_increment, column_name = "Id")]
    pub id:   i64,
    #[tsqlorm(column_name = "Name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "UserRoles")]
pub struct UserRole {
    #[tsqlorm(primary_key, foreign_key, column_name = "User")]
    pub user: Option<User>,
    #[tsqlorm(primary_key, foreign_key, column_name = "Role")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "Badges")]
pub struct Badge {
    #[tsqlorm(primary_key, auto_increment, column_name = "Id")]
    pub id:    i64,
    #[tsqlorm(column_name = "Label")]
    pub label: String,
}

/// Junction that has no key pointing at `Badge`
#[derive(Clone, Debug, PartialEq, Table)]
#[tsqlorm(table_name = "UserBadges")]
pub struct UserBadge {
    #[tsqlorm(primary_key, auto_increment, column_name = "Id")]
    pub id:   i64,
    #[tsqlorm(foreign_key, column_name = "User")]
    pub user: Option<User>,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Connection in test mode over a fresh in-memory driver
async fn create_test_db() -> (MemoryDriver, Connection) {
    init_tracing();
    let driver = MemoryDriver::new();
    let db = Builder::new(driver.clone()).with_test_mode(true).register::<User>().build().await.unwrap();
    let conn = db.connect().await.unwrap();
    (driver, conn)
}

/// Connection outside test mode, reading the layout from declarations
async fn create_live_db() -> (MemoryDriver, Connection) {
    init_tracing();
    let driver = MemoryDriver::new();
    let db = Builder::new(driver.clone())
        .with_schema_source(DeclaredSchemaSource)
        .register::<User>()
        .build()
        .await
        .unwrap();
    let conn = db.connect().await.unwrap();
    (driver, conn)
}

fn user_row(id: i64, name: &str, organisation: Option<i64>) -> Vec<Value> {
    vec![Value::Integer(id), Value::Text(name.to_string()), organisation.map(Value::Integer).unwrap_or(Value::Null)]
}

fn user_rows(count: i64) -> MemoryRows {
    (1..=count).fold(MemoryRows::new(["Id", "Name", "Organisation"]), |rows, id| {
        let name: String = Name().fake();
        rows.row(user_row(id, &name, None))
    })
}

async fn fetch_user(driver: &MemoryDriver, conn: &Connection, id: i64, name: &str) -> Entity {
    driver.push_rows(MemoryRows::new(["Id", "Name", "Organisation"]).row(user_row(id, name, None)));
    let user = User::find_by_id(conn, id).await.unwrap().unwrap();
    driver.clear();
    user
}

// =============================================================================
// Fetch Tests
// =============================================================================

#[tokio::test]
async fn test_basic_fetch() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(user_rows(5));

    let mut users = User::collection(&conn).unwrap();
    users.fetch(&conn).await.unwrap();

    assert_eq!(users.len(), 5);
    assert_eq!(users.executed_query().unwrap().to_uppercase(), "SELECT * FROM [DBO].[USERS];");
    assert!(users.iter().all(|u| u.state() == ObjectState::Fetched));
}

#[tokio::test]
async fn test_fetch_top() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(user_rows(1));

    let mut users = User::collection(&conn).unwrap();
    users.fetch_top(&conn, 1).await.unwrap();

    assert_eq!(users.executed_query().unwrap().to_uppercase(), "SELECT TOP (1) * FROM [DBO].[USERS];");
}

#[tokio::test]
async fn test_fetch_with_and_predicate() {
    let (driver, conn) = create_test_db().await;

    let mut users = User::collection(&conn).unwrap().filter(UserColumn::Id.eq(19).and(UserColumn::Id.eq(12)));
    users.fetch(&conn).await.unwrap();

    assert!(users.is_empty());
    assert_eq!(
        users.executed_query().unwrap().to_uppercase(),
        "SELECT * FROM [DBO].[USERS] WHERE (([ID] = @PARAM1) AND ([ID] = @PARAM2));"
    );
    let executed = driver.executed();
    assert_eq!(executed[0].parameters[0].value, Value::Integer(19));
    assert_eq!(executed[0].parameters[1].value, Value::Integer(12));
}

#[tokio::test]
async fn test_fetch_with_left_join() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(
        MemoryRows::new(["Id", "Name", "Organisation", "Id", "Name"])
            .row([
                Value::Integer(1),
                Value::Text("Ada".to_string()),
                Value::Integer(4),
                Value::Integer(4),
                Value::Text("Acme".to_string()),
            ])
            .row([Value::Integer(2), Value::Text("Bob".to_string()), Value::Null, Value::Null, Value::Null]),
    );

    let mut users = User::collection(&conn).unwrap().join(UserColumn::Organisation.left());
    users.fetch_top(&conn, 1).await.unwrap();

    assert_eq!(
        users.executed_query().unwrap().to_uppercase(),
        "SELECT TOP (1) * FROM [DBO].[USERS] AS [U] LEFT JOIN [DBO].[ORGANISATIONS] AS [O] ON [U].[ORGANISATION] = \
         [O].[ID];"
    );

    let ada = users.get(0).unwrap();
    let organisation = ada.entity("Organisation").unwrap().unwrap();
    assert_eq!(organisation.value("Name").unwrap(), Value::Text("Acme".to_string()));
    assert_eq!(organisation.state(), ObjectState::Fetched);
    assert_eq!(ada.value("Organisation").unwrap(), Value::Integer(4));

    let bob = users.get(1).unwrap();
    assert!(bob.entity("Organisation").unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_into_models() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(MemoryRows::new(["Id", "Name", "Organisation", "Id", "Name"]).row([
        Value::Integer(1),
        Value::Text("Ada".to_string()),
        Value::Integer(4),
        Value::Integer(4),
        Value::Text("Acme".to_string()),
    ]));

    let mut users = User::collection(&conn).unwrap().join(UserColumn::Organisation.inner());
    users.fetch(&conn).await.unwrap();
    let models = users.models().unwrap();

    assert_eq!(models, vec![User {
        id:           1,
        name:         "Ada".to_string(),
        organisation: Some(Organisation { id: 4, name: "Acme".to_string() }),
        roles:        vec![],
        badges:       vec![],
    }]);
}

#[tokio::test]
async fn test_many_to_many_rows_fold_per_root_key() {
    let (driver, conn) = create_test_db().await;
    let text = |s: &str| Value::Text(s.to_string());
    driver.push_rows(
        MemoryRows::new(["Id", "Name", "Organisation", "User", "Role", "Id", "Name"])
            .row([Value::Integer(1), text("Ada"), Value::Null, Value::Integer(1), Value::Integer(10), Value::Integer(10), text("admin")])
            .row([Value::Integer(1), text("Ada"), Value::Null, Value::Integer(1), Value::Integer(11), Value::Integer(11), text("editor")])
            .row([Value::Integer(2), text("Bob"), Value::Null, Value::Null, Value::Null, Value::Null, Value::Null]),
    );

    let mut users = User::collection(&conn).unwrap().join(UserColumn::Roles.left());
    users.fetch(&conn).await.unwrap();

    assert_eq!(users.len(), 2);
    let roles: Vec<Value> =
        users.get(0).unwrap().related("roles").unwrap().iter().map(|r| r.value("Name").unwrap()).collect();
    assert_eq!(roles, vec![text("admin"), text("editor")]);
    assert!(users.get(1).unwrap().related("roles").unwrap().is_empty());

    let models = users.models().unwrap();
    assert_eq!(models[0].roles.len(), 2);
    assert_eq!(models[0].roles[1], Role { id: 11, name: "editor".to_string() });
}

#[tokio::test]
async fn test_many_to_many_projection_without_root_key() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(
        MemoryRows::new(["Name", "Name"]).row([Value::Text("Ada".to_string()), Value::Text("admin".to_string())]),
    );

    let mut users = User::collection(&conn)
        .unwrap()
        .join(UserColumn::Roles.left())
        .select(Expr::tuple([UserColumn::Name.expr(), UserColumn::Roles.field("name")]));
    let err = users.fetch(&conn).await.unwrap_err();

    assert!(matches!(err, Error::Schema(SchemaError::KeyColumnMismatch { .. })));
}

#[tokio::test]
async fn test_many_to_many_without_key_to_target() {
    let (_driver, conn) = create_test_db().await;

    let mut users = User::collection(&conn).unwrap().join(UserColumn::Badges.left());
    let err = users.fetch(&conn).await.unwrap_err();

    assert!(matches!(err, Error::Join(JoinError::ForeignKeyNotImplemented { .. })));
}

#[tokio::test]
async fn test_fetch_is_idempotent_until_query_changes() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(user_rows(2));

    let mut users = User::collection(&conn).unwrap().filter(UserColumn::Name.starts_with("A"));
    users.fetch(&conn).await.unwrap();
    users.fetch(&conn).await.unwrap();
    assert_eq!(driver.executed().len(), 1);
    assert_eq!(users.len(), 2);

    let mut users = users.and_filter(UserColumn::Id.gt(1));
    users.fetch(&conn).await.unwrap();
    assert_eq!(driver.executed().len(), 2);
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_null_in_non_nullable_column() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(MemoryRows::new(["Id", "Name", "Organisation"]).row([Value::Integer(1), Value::Null, Value::Null]));

    let mut users = User::collection(&conn).unwrap();
    let err = users.fetch(&conn).await.unwrap_err();

    assert!(matches!(err, Error::Nullability { ref column, .. } if column == "Name"));
}

#[tokio::test]
async fn test_find_by_id_in_test_mode_reports_not_found() {
    let (_driver, conn) = create_test_db().await;

    let err = User::find_by_id(&conn, 99).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { ref table, .. } if table == "Users"));
}

#[tokio::test]
async fn test_fetch_by_primary_key_outside_test_mode() {
    let (driver, conn) = create_live_db().await;

    let mut user = conn.entity::<User>().unwrap();
    assert!(!user.fetch_by_primary_key(&conn, [Value::Integer(99)]).await.unwrap());
    assert!(user.is_new());

    driver.push_rows(MemoryRows::new(["Id", "Name", "Organisation"]).row(user_row(3, "Grace", None)));
    assert!(user.fetch_by_primary_key(&conn, [Value::Integer(3)]).await.unwrap());
    assert_eq!(user.state(), ObjectState::Fetched);
    assert_eq!(user.value("Name").unwrap(), Value::Text("Grace".to_string()));
    assert_eq!(
        driver.executed_sql()[1].to_uppercase(),
        "SELECT * FROM [DBO].[USERS] WHERE ([ID] = @PARAM1);"
    );
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_insert_assigns_identity() {
    let (driver, conn) = create_test_db().await;
    driver.push_identity(42);

    let mut user = User::create(&conn).unwrap();
    user.set("Name", "Ada").unwrap();
    user.save(&conn).await.unwrap();

    assert_eq!(
        driver.executed_sql()[0].to_uppercase(),
        "INSERT INTO [DBO].[USERS] ([NAME], [ORGANISATION]) VALUES(@PARAM1, @PARAM2); SELECT CAST(SCOPE_IDENTITY() AS \
         INT);"
    );
    assert_eq!(user.primary_key().keys()[0].value, Value::Integer(42));
    assert_eq!(user.value("Id").unwrap(), Value::Integer(42));
    assert_eq!(user.state(), ObjectState::Saved);
    assert_eq!(user.original().unwrap().state(), ObjectState::NewRecord);
    assert!(!user.is_dirty());
}

#[tokio::test]
async fn test_save_cascades_to_new_child() {
    let (driver, conn) = create_test_db().await;

    let mut organisation = Organisation::create(&conn).unwrap();
    organisation.set("Name", "Acme").unwrap();
    let mut user = User::create(&conn).unwrap();
    user.set("Name", "Ada").unwrap();
    user.attach("Organisation", organisation).unwrap();
    user.save(&conn).await.unwrap();

    let executed = driver.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].sql.to_uppercase().starts_with("INSERT INTO [DBO].[ORGANISATIONS]"));
    assert!(executed[1].sql.to_uppercase().starts_with("INSERT INTO [DBO].[USERS]"));
    assert_eq!(executed[1].parameters[1].value, Value::Integer(1));
    assert_eq!(user.entity("Organisation").unwrap().unwrap().state(), ObjectState::Saved);
    assert_eq!(user.value("Id").unwrap(), Value::Integer(2));
}

#[tokio::test]
async fn test_dirty_columns_follow_snapshot() {
    let (driver, conn) = create_test_db().await;
    let mut user = fetch_user(&driver, &conn, 7, "Ada").await;

    user.set("Name", "Grace").unwrap();
    assert!(user.is_column_dirty("Name").unwrap());
    user.set("Name", "Ada").unwrap();
    assert!(!user.is_column_dirty("Name").unwrap());
    assert!(!user.is_dirty());

    user.save(&conn).await.unwrap();
    assert!(driver.executed().is_empty());

    user.set("Name", "Grace").unwrap();
    user.save(&conn).await.unwrap();
    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql.to_uppercase(),
        "UPDATE [U] SET [U].[NAME] = @PARAM1 FROM [DBO].[USERS] AS [U] WHERE ([U].[ID] = @PARAM2);"
    );
    assert_eq!(executed[0].parameters[1].value, Value::Integer(7));
    assert_eq!(user.state(), ObjectState::Saved);
    assert!(!user.is_dirty());
}

#[tokio::test]
async fn test_delete_lifecycle() {
    let (driver, conn) = create_test_db().await;
    let mut user = fetch_user(&driver, &conn, 3, "Ada").await;
    assert_eq!(user.state(), ObjectState::Fetched);

    user.schedule_deletion().unwrap();
    assert_eq!(user.state(), ObjectState::ScheduledForDeletion);
    assert!(user.is_marked_as_deleted());

    user.save(&conn).await.unwrap();
    assert_eq!(user.state(), ObjectState::Deleted);
    assert!(user.is_marked_as_deleted());

    user.delete(&conn).await.unwrap();
    user.save(&conn).await.unwrap();

    let deletes: Vec<String> =
        driver.executed_sql().into_iter().filter(|sql| sql.to_uppercase().starts_with("DELETE")).collect();
    assert_eq!(deletes.len(), 1);
    assert!(deletes[0].to_uppercase().starts_with("DELETE FROM [DBO].[USERS]"));
    assert!(user.set("Name", "Grace").is_err());
}

#[tokio::test]
async fn test_combined_key_record_delete() {
    let (driver, conn) = create_test_db().await;

    let mut link = conn.record::<UserRole>([Value::Integer(1), Value::Integer(2)]).unwrap();
    assert!(link.primary_key().is_combined());
    link.delete(&conn).await.unwrap();

    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].sql.to_uppercase().starts_with("DELETE FROM [DBO].[USERROLES]"));
    assert!(executed[0].sql.contains(" AND "));
    let values: Vec<Value> = executed[0].parameters.iter().map(|p| p.value.clone()).collect();
    assert_eq!(values, vec![Value::Integer(1), Value::Integer(2)]);
    assert_eq!(link.state(), ObjectState::Deleted);
}

#[tokio::test]
async fn test_save_changes_writes_only_dirty_entities() {
    let (driver, conn) = create_test_db().await;
    driver.push_rows(user_rows(3));

    let mut users = User::collection(&conn).unwrap();
    users.fetch(&conn).await.unwrap();
    driver.clear();

    users.get_mut(1).unwrap().set("Name", "Changed").unwrap();
    users.create().set("Name", "Added").unwrap();
    users.save_changes(&conn).await.unwrap();

    let sql: Vec<String> = driver.executed_sql().iter().map(|s| s.to_uppercase()).collect();
    assert_eq!(sql.len(), 2);
    assert!(sql[0].starts_with("UPDATE [U]"));
    assert!(sql[1].starts_with("INSERT INTO [DBO].[USERS]"));
}

#[tokio::test]
async fn test_driver_failure_leaves_entity_new() {
    let (driver, conn) = create_test_db().await;
    driver.push_failure("connection reset");

    let mut user = User::create(&conn).unwrap();
    user.set("Name", "Ada").unwrap();
    let err = user.save(&conn).await.unwrap_err();

    assert!(matches!(err, Error::Driver(ref message) if message == "connection reset"));
    assert!(user.is_new());
}

#[tokio::test]
async fn test_combined_key_follows_saved_values() {
    let (driver, conn) = create_test_db().await;

    let mut link = conn.entity::<UserRole>().unwrap();
    link.set("User", 5).unwrap();
    link.set("Role", 3).unwrap();
    link.save(&conn).await.unwrap();

    assert_eq!(link.state(), ObjectState::Saved);
    for key in link.primary_key().keys() {
        assert_eq!(key.value, link.value(&key.column).unwrap());
    }

    driver.clear();
    link.set("Role", 4).unwrap();
    assert!(link.is_dirty());
    link.save(&conn).await.unwrap();

    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql.to_uppercase(),
        "UPDATE [U] SET [U].[ROLE] = @PARAM1 FROM [DBO].[USERROLES] AS [U] WHERE (([U].[USER] = @PARAM2) AND \
         ([U].[ROLE] = @PARAM3));"
    );
    let values: Vec<Value> = executed[0].parameters.iter().map(|p| p.value.clone()).collect();
    assert_eq!(values, vec![Value::Integer(4), Value::Integer(5), Value::Integer(3)]);
    assert_eq!(link.primary_key().values(), vec![Value::Integer(5), Value::Integer(4)]);
}

#[tokio::test]
async fn test_save_without_change_tracking() {
    init_tracing();
    let driver = MemoryDriver::new();
    let db = Builder::new(driver.clone())
        .with_test_mode(true)
        .with_change_tracking(false)
        .register::<User>()
        .build()
        .await
        .unwrap();
    let conn = db.connect().await.unwrap();

    let mut user = fetch_user(&driver, &conn, 7, "Ada").await;
    assert_eq!(user.state(), ObjectState::Fetched);
    assert!(user.original().is_none());
    assert!(!user.is_dirty());

    // Without a snapshot any assignment counts, even of the same value
    user.set("Name", "Ada").unwrap();
    assert!(user.is_dirty());
    assert!(user.is_column_dirty("Name").unwrap());

    user.save(&conn).await.unwrap();
    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].sql.to_uppercase(),
        "UPDATE [U] SET [U].[NAME] = @PARAM1 FROM [DBO].[USERS] AS [U] WHERE ([U].[ID] = @PARAM2);"
    );
    assert_eq!(user.state(), ObjectState::Saved);
    assert!(user.original().is_none());
    assert!(!user.is_dirty());
}

#[tokio::test]
async fn test_fetch_using_columns() {
    let (driver, conn) = create_live_db().await;

    let mut user = conn.entity::<User>().unwrap();
    driver.push_rows(MemoryRows::new(["Id", "Name", "Organisation"]).row(user_row(4, "Ada", Some(2))));
    assert!(user.fetch_using(&conn, &[("Name", Value::Text("Ada".to_string()))]).await.unwrap());

    assert_eq!(user.state(), ObjectState::Fetched);
    assert_eq!(user.value("Id").unwrap(), Value::Integer(4));
    assert_eq!(user.value("Organisation").unwrap(), Value::Integer(2));
    let executed = driver.executed();
    assert_eq!(executed[0].sql.to_uppercase(), "SELECT * FROM [DBO].[USERS] WHERE ([NAME] = @PARAM1);");
    assert_eq!(executed[0].parameters[0].value, Value::Text("Ada".to_string()));
}

#[tokio::test]
async fn test_fetch_using_without_match() {
    let (_driver, conn) = create_live_db().await;
    let mut user = conn.entity::<User>().unwrap();
    assert!(!user.fetch_using(&conn, &[("Name", Value::Text("Nobody".to_string()))]).await.unwrap());
    assert!(user.is_new());

    let (_driver, conn) = create_test_db().await;
    let mut user = conn.entity::<User>().unwrap();
    let err = user.fetch_using(&conn, &[("Name", Value::Text("Nobody".to_string()))]).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { ref table, .. } if table == "Users"));
    assert!(user.is_new());
}

// =============================================================================
// Transaction Tests
// =============================================================================

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let (driver, conn) = create_test_db().await;

    conn.begin().await.unwrap();
    assert!(conn.in_transaction());
    let mut user = User::create(&conn).unwrap();
    user.set("Name", "Ada").unwrap();
    user.save(&conn).await.unwrap();
    conn.commit().await.unwrap();
    assert!(!conn.in_transaction());

    conn.begin().await.unwrap();
    conn.rollback().await.unwrap();

    assert_eq!(driver.transactions(), vec!["BEGIN", "COMMIT", "BEGIN", "ROLLBACK"]);
}

// =============================================================================
// Derive Tests
// =============================================================================

#[test]
fn test_derived_column_metadata() {
    assert_eq!(UserColumn::all().len(), 5);
    assert_eq!(UserColumn::Organisation.name(), "Organisation");
    assert_eq!(UserColumn::Organisation.property(), "organisation");
    assert!(UserColumn::Organisation.is_foreign_key());
    assert!(UserColumn::Organisation.is_nullable());
    assert!(UserColumn::Roles.is_many_to_many());
    assert!(UserColumn::Id.is_primary_key() && UserColumn::Id.is_auto_increment());
    assert!(!UserRoleColumn::User.is_nullable());
    assert_eq!(BadgeColumn::Label.column_type(), ColumnType::Text);
    assert_eq!(UserColumn::Name.to_string(), "Name");
}

#[tokio::test]
async fn test_catalog_registers_relation_targets() {
    let (_driver, conn) = create_test_db().await;

    for table in ["Users", "Organisations", "Roles", "UserRoles", "Badges", "UserBadges"] {
        assert!(conn.catalog().describe_table(table).is_some(), "{} is not registered", table);
    }
    let schema = conn.describe::<UserRole>().unwrap();
    assert!(schema.is_combined_key());
}

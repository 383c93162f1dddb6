//! End-to-end tests of the `mealplan` binary.
//!
//! Each test runs the compiled binary against its own temporary database on
//! the shared test PostgreSQL, with an empty config directory.

use std::path::Path;
use std::process::{Command, Output};

use mealplan_db::queries::foods;
use mealplan_db::queries::users::{self, NewUser};
use mealplan_test_utils::{create_test_db, drop_test_db, pg_url};

fn run(db_url: &str, config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mealplan"))
        .arg("--database-url")
        .arg(db_url)
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("MEALPLAN_DATABASE_URL")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run mealplan binary")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test]
async fn load_generate_show_list() {
    let (pool, db_name) = create_test_db().await;
    let db_url = format!("{}/{db_name}", pg_url().await);
    let config_home = tempfile::tempdir().unwrap();

    let data = config_home.path().join("foods.json");
    std::fs::write(
        &data,
        r#"[
            {"name": "Bread", "category": "Bakery", "calories": 265, "allergens": ["Gluten"]},
            {"name": "Apple", "category": "Fruit", "calories": 52},
            {"name": "Pear", "category": "Fruit", "calories": 57}
        ]"#,
    )
    .unwrap();
    let data = data.to_str().unwrap();

    let out = stdout(&run(&db_url, config_home.path(), &["load-foods", data]));
    assert!(out.contains("Loaded 3 food(s)"), "unexpected output: {out}");
    let out = stdout(&run(&db_url, config_home.path(), &["load-foods", data]));
    assert!(out.contains("Loaded 0 food(s)"), "unexpected output: {out}");
    assert_eq!(foods::count_foods(&pool).await.unwrap(), 3);

    let user = users::insert_user(
        &pool,
        &NewUser {
            name: "Ada",
            email: "ada@example.com",
            allergies: &["Gluten".to_owned()],
        },
    )
    .await
    .unwrap()
    .expect("email should be unused");
    let user_id = user.id.to_string();

    let out = stdout(&run(
        &db_url,
        config_home.path(),
        &["plan", "generate", &user_id, "--week", "2024-01-03"],
    ));
    assert!(out.contains("Week of:  2024-01-01"), "unexpected output: {out}");
    assert!(!out.contains("Bread"));
    for day in ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"] {
        assert!(out.contains(day), "missing {day} in {out}");
    }

    let plan_id: String = sqlx::query_scalar("SELECT id::text FROM meal_plans")
        .fetch_one(&pool)
        .await
        .unwrap();

    let out = stdout(&run(&db_url, config_home.path(), &["plan", "show", &plan_id]));
    assert!(out.contains(&plan_id));

    let out = stdout(&run(&db_url, config_home.path(), &["plan", "list", &user_id]));
    assert!(out.contains(&plan_id));
    assert!(out.contains("2024-01-01"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn plan_errors_exit_nonzero() {
    let (pool, db_name) = create_test_db().await;
    let db_url = format!("{}/{db_name}", pg_url().await);
    let config_home = tempfile::tempdir().unwrap();

    let bad_week = run(
        &db_url,
        config_home.path(),
        &["plan", "generate", &uuid::Uuid::new_v4().to_string(), "--week", "soon"],
    );
    assert!(!bad_week.status.success());
    assert!(String::from_utf8_lossy(&bad_week.stderr).contains("invalid week"));

    let unknown_user = run(
        &db_url,
        config_home.path(),
        &["plan", "generate", &uuid::Uuid::new_v4().to_string()],
    );
    assert!(!unknown_user.status.success());
    assert!(String::from_utf8_lossy(&unknown_user.stderr).contains("not found"));

    let bad_id = run(&db_url, config_home.path(), &["plan", "show", "nope"]);
    assert!(!bad_id.status.success());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[test]
fn init_writes_config_file() {
    let config_home = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mealplan"))
        .args(["init", "--db-url", "postgresql://example:5432/mealplan"])
        .env("XDG_CONFIG_HOME", config_home.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let written =
        std::fs::read_to_string(config_home.path().join("mealplan/config.toml")).unwrap();
    assert!(written.contains("postgresql://example:5432/mealplan"));
    assert!(written.contains("dimension = 384"));

    let again = Command::new(env!("CARGO_BIN_EXE_mealplan"))
        .arg("init")
        .env("XDG_CONFIG_HOME", config_home.path())
        .output()
        .unwrap();
    assert!(!again.status.success(), "init without --force must not overwrite");
}

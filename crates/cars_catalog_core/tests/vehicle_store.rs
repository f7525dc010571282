use cars_catalog_core::db::open_pool;
use cars_catalog_core::{
    FieldUpdate, Owner, PoolConfig, RepoError, SqliteVehicleRepository, Vehicle, VehicleFilter,
    VehiclePatch, VehicleRepository, VehicleValidationError,
};
use std::thread;
use tempfile::TempDir;

fn setup() -> (TempDir, SqliteVehicleRepository) {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(dir.path().join("catalog.sqlite3"), &PoolConfig::default()).unwrap();
    let repo = SqliteVehicleRepository::try_new(pool).unwrap();
    (dir, repo)
}

fn count_rows(repo: &SqliteVehicleRepository, table: &str) -> i64 {
    let conn = repo.pool().get().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn petrov() -> Owner {
    Owner::new("Ivan", "Petrov").with_patronymic("Ivanovich")
}

fn vehicle(reg_num: &str, mark: &str, year: i32) -> Vehicle {
    Vehicle::new(reg_num, mark, "Base", petrov()).with_year(year)
}

fn reg_nums(records: &[cars_catalog_core::VehicleRecord]) -> Vec<&str> {
    records.iter().map(|record| record.reg_num.as_str()).collect()
}

#[test]
fn add_then_get_returns_vehicle_with_owner() {
    let (_dir, repo) = setup();
    let inserted = repo
        .add(&[Vehicle::new("X123XX150", "Lada", "Vesta", petrov()).with_year(2019)])
        .unwrap();
    assert_eq!(inserted, 1);

    let record = repo.get("X123XX150").unwrap().unwrap();
    assert_eq!(record.mark, "Lada");
    assert_eq!(record.model, "Vesta");
    assert_eq!(record.year, Some(2019));
    assert_eq!(record.owner, petrov());
}

#[test]
fn adding_existing_registration_number_is_silent_noop() {
    let (_dir, repo) = setup();
    repo.add(&[vehicle("A001AA", "BMW", 2020)]).unwrap();
    let original = repo.get("A001AA").unwrap().unwrap();

    let replacement = Vehicle::new("A001AA", "Audi", "A4", Owner::new("Olga", "Smirnova"));
    let inserted = repo.add(&[replacement]).unwrap();

    assert_eq!(inserted, 0);
    assert_eq!(repo.get("A001AA").unwrap().unwrap(), original);
    assert_eq!(count_rows(&repo, "vehicles"), 1);
}

#[test]
fn identical_owner_triples_share_one_owner_row() {
    let (_dir, repo) = setup();
    repo.add(&[vehicle("A001AA", "BMW", 2020), vehicle("B002BB", "Audi", 2021)])
        .unwrap();

    assert_eq!(count_rows(&repo, "owners"), 1);
    let first = repo.get("A001AA").unwrap().unwrap();
    let second = repo.get("B002BB").unwrap().unwrap();
    assert_eq!(first.owner_id, second.owner_id);
}

#[test]
fn missing_patronymic_is_a_distinct_owner() {
    let (_dir, repo) = setup();
    repo.add(&[
        Vehicle::new("A001AA", "BMW", "X5", Owner::new("Ivan", "Petrov")),
        Vehicle::new("B002BB", "BMW", "X6", petrov()),
    ])
    .unwrap();

    assert_eq!(count_rows(&repo, "owners"), 2);
    let without = repo.get("A001AA").unwrap().unwrap();
    let with = repo.get("B002BB").unwrap().unwrap();
    assert_ne!(without.owner_id, with.owner_id);
    assert_eq!(without.owner.patronymic, None);
}

#[test]
fn invalid_vehicle_is_rejected_before_io() {
    let (_dir, repo) = setup();
    let err = repo
        .add(&[vehicle("A001AA", "BMW", 2020), vehicle("B002BB", "BMW", 1700)])
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(VehicleValidationError::YearOutOfRange { year: 1700, .. })
    ));
    assert_eq!(count_rows(&repo, "vehicles"), 0);
    assert_eq!(count_rows(&repo, "owners"), 0);
}

#[test]
fn failing_statement_rolls_back_the_whole_batch() {
    let (_dir, repo) = setup();
    repo.pool()
        .get()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_c BEFORE INSERT ON vehicles
             WHEN NEW.reg_num = 'C003CC'
             BEGIN SELECT RAISE(ABORT, 'registry rejected C003CC'); END;",
        )
        .unwrap();

    let batch: Vec<Vehicle> = ["A001AA", "B002BB", "C003CC", "D004DD", "E005EE"]
        .iter()
        .enumerate()
        .map(|(i, reg_num)| {
            Vehicle::new(*reg_num, "BMW", "X5", Owner::new(format!("Owner{i}"), "Test"))
        })
        .collect();
    let err = repo.add(&batch).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
    assert!(err.to_string().contains("registry rejected"));
    assert_eq!(count_rows(&repo, "vehicles"), 0);
    assert_eq!(count_rows(&repo, "owners"), 0);
}

#[test]
fn update_of_model_keeps_other_fields() {
    let (_dir, repo) = setup();
    repo.add(&[Vehicle::new("A001AA", "BMW", "X5", petrov()).with_year(2020)])
        .unwrap();
    let before = repo.get("A001AA").unwrap().unwrap();

    repo.update(&VehiclePatch::new("A001AA").model("X6")).unwrap();

    let after = repo.get("A001AA").unwrap().unwrap();
    assert_eq!(after.model, "X6");
    assert_eq!(after.mark, before.mark);
    assert_eq!(after.year, before.year);
    assert_eq!(after.owner_id, before.owner_id);
}

#[test]
fn zero_year_is_stored_as_unknown() {
    let (_dir, repo) = setup();
    let inserted = repo
        .add(&[Vehicle::new("A001AA", "BMW", "X5", petrov()).with_year(0)])
        .unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(repo.get("A001AA").unwrap().unwrap().year, None);
}

#[test]
fn blank_text_and_zero_year_keep_stored_values() {
    let (_dir, repo) = setup();
    repo.add(&[Vehicle::new("A001AA", "BMW", "X5", petrov()).with_year(2020)])
        .unwrap();

    repo.update(&VehiclePatch::new("A001AA").mark("").model("X6").year(0))
        .unwrap();

    let record = repo.get("A001AA").unwrap().unwrap();
    assert_eq!(record.mark, "BMW");
    assert_eq!(record.model, "X6");
    assert_eq!(record.year, Some(2020));
}

#[test]
fn update_can_clear_and_set_year() {
    let (_dir, repo) = setup();
    repo.add(&[vehicle("A001AA", "BMW", 2020)]).unwrap();

    repo.update(&VehiclePatch::new("A001AA").clear_year())
        .unwrap();
    assert_eq!(repo.get("A001AA").unwrap().unwrap().year, None);

    repo.update(&VehiclePatch::new("A001AA").year(2018)).unwrap();
    assert_eq!(repo.get("A001AA").unwrap().unwrap().year, Some(2018));
}

#[test]
fn half_specified_owner_update_is_rejected_without_mutation() {
    let (_dir, repo) = setup();
    repo.add(&[vehicle("A001AA", "BMW", 2020)]).unwrap();
    let before = repo.get("A001AA").unwrap().unwrap();

    let mut patch = VehiclePatch::new("A001AA").mark("Audi");
    patch.owner_name = FieldUpdate::Set("Olga".to_string());
    let err = repo.update(&patch).unwrap_err();

    assert!(err.is_validation());
    assert_eq!(repo.get("A001AA").unwrap().unwrap(), before);
    assert_eq!(count_rows(&repo, "owners"), 1);
}

#[test]
fn update_reassigns_to_existing_or_new_owner() {
    let (_dir, repo) = setup();
    let smirnova = Owner::new("Olga", "Smirnova");
    repo.add(&[
        vehicle("A001AA", "BMW", 2020),
        Vehicle::new("B002BB", "Audi", "A4", smirnova.clone()),
    ])
    .unwrap();
    let smirnova_id = repo.get("B002BB").unwrap().unwrap().owner_id;

    repo.update(&VehiclePatch::new("A001AA").owner(smirnova))
        .unwrap();
    assert_eq!(repo.get("A001AA").unwrap().unwrap().owner_id, smirnova_id);
    assert_eq!(count_rows(&repo, "owners"), 2);

    let newcomer = Owner::new("Pavel", "Orlov").with_patronymic("Petrovich");
    repo.update(&VehiclePatch::new("A001AA").owner(newcomer.clone()))
        .unwrap();
    let record = repo.get("A001AA").unwrap().unwrap();
    assert_eq!(record.owner, newcomer);
    assert_eq!(count_rows(&repo, "owners"), 3);
}

#[test]
fn update_of_missing_vehicle_is_not_found_and_creates_no_owner() {
    let (_dir, repo) = setup();
    let patch = VehiclePatch::new("Z999ZZ").owner(Owner::new("Pavel", "Orlov"));

    let err = repo.update(&patch).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(ref reg_num) if reg_num == "Z999ZZ"));
    assert_eq!(count_rows(&repo, "owners"), 0);
}

#[test]
fn delete_is_idempotent_and_rejects_empty_key() {
    let (_dir, repo) = setup();
    repo.add(&[vehicle("A001AA", "BMW", 2020)]).unwrap();

    assert!(repo.delete("A001AA").unwrap());
    assert!(!repo.delete("A001AA").unwrap());
    assert!(!repo.delete("NOPE").unwrap());
    assert!(repo.get("A001AA").unwrap().is_none());
    assert_eq!(count_rows(&repo, "owners"), 1);

    assert!(matches!(
        repo.delete(""),
        Err(RepoError::Validation(VehicleValidationError::EmptyRegNum))
    ));
}

#[test]
fn filter_matches_mark_and_exact_year() {
    let (_dir, repo) = setup();
    repo.add(&[
        vehicle("C", "Audi", 2020),
        vehicle("B", "BMW", 2021),
        vehicle("A", "BMW", 2020),
    ])
    .unwrap();

    let bmw = VehicleFilter {
        mark: Some("BMW".to_string()),
        ..VehicleFilter::default()
    };
    assert_eq!(reg_nums(&repo.get_all(&bmw, 0, 10).unwrap()), ["A", "B"]);

    let bmw_2020 = VehicleFilter {
        year: Some(2020),
        ..bmw
    };
    assert_eq!(reg_nums(&repo.get_all(&bmw_2020, 0, 10).unwrap()), ["A"]);

    let all = repo.get_all(&VehicleFilter::default(), 0, 10).unwrap();
    assert_eq!(reg_nums(&all), ["A", "B", "C"]);
}

#[test]
fn text_filters_are_case_sensitive_substrings() {
    let (_dir, repo) = setup();
    repo.add(&[
        Vehicle::new("A001AA77", "Mercedes-Benz", "E200", petrov()),
        Vehicle::new("B002BB50", "mercedes", "C180", Owner::new("Olga", "Smirnova")),
    ])
    .unwrap();

    let by_mark = VehicleFilter {
        mark: Some("Merc".to_string()),
        ..VehicleFilter::default()
    };
    assert_eq!(reg_nums(&repo.get_all(&by_mark, 0, 10).unwrap()), ["A001AA77"]);

    let by_reg = VehicleFilter {
        reg_num: Some("BB5".to_string()),
        ..VehicleFilter::default()
    };
    assert_eq!(reg_nums(&repo.get_all(&by_reg, 0, 10).unwrap()), ["B002BB50"]);

    let literal_percent = VehicleFilter {
        model: Some("%".to_string()),
        ..VehicleFilter::default()
    };
    assert!(repo.get_all(&literal_percent, 0, 10).unwrap().is_empty());
}

#[test]
fn owner_filters_apply_to_joined_owner() {
    let (_dir, repo) = setup();
    repo.add(&[
        Vehicle::new("A001AA", "BMW", "X5", petrov()),
        Vehicle::new("B002BB", "BMW", "X6", Owner::new("Ivan", "Sidorov")),
    ])
    .unwrap();

    let by_name = VehicleFilter {
        name: Some("Iva".to_string()),
        surname: Some("Sid".to_string()),
        ..VehicleFilter::default()
    };
    assert_eq!(reg_nums(&repo.get_all(&by_name, 0, 10).unwrap()), ["B002BB"]);

    let by_patronymic = VehicleFilter {
        patronymic: Some("vich".to_string()),
        ..VehicleFilter::default()
    };
    assert_eq!(
        reg_nums(&repo.get_all(&by_patronymic, 0, 10).unwrap()),
        ["A001AA"]
    );
}

#[test]
fn pagination_window_is_stable() {
    let (_dir, repo) = setup();
    let batch: Vec<Vehicle> = ["A005", "A002", "A006", "A001", "A004", "A003"]
        .iter()
        .map(|reg_num| vehicle(reg_num, "Lada", 2015))
        .collect();
    repo.add(&batch).unwrap();

    let page = repo.get_all(&VehicleFilter::default(), 2, 2).unwrap();
    assert_eq!(reg_nums(&page), ["A003", "A004"]);

    let tail = repo.get_all(&VehicleFilter::default(), 5, 10).unwrap();
    assert_eq!(reg_nums(&tail), ["A006"]);
}

#[test]
fn no_matches_yield_empty_list() {
    let (_dir, repo) = setup();
    assert!(repo
        .get_all(&VehicleFilter::default(), 0, 10)
        .unwrap()
        .is_empty());

    repo.add(&[vehicle("A001AA", "BMW", 2020)]).unwrap();
    let filter = VehicleFilter {
        year: Some(1999),
        ..VehicleFilter::default()
    };
    assert!(repo.get_all(&filter, 0, 10).unwrap().is_empty());
    assert!(repo
        .get_all(&VehicleFilter::default(), 10, 10)
        .unwrap()
        .is_empty());
}

#[test]
fn concurrent_writers_resolve_one_owner() {
    let (_dir, repo) = setup();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let repo = repo.clone();
            thread::spawn(move || {
                let batch: Vec<Vehicle> = (0..5)
                    .map(|i| vehicle(&format!("W{worker}N{i}"), "Lada", 2010))
                    .collect();
                repo.add(&batch).unwrap()
            })
        })
        .collect();
    let inserted: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    assert_eq!(inserted, 20);
    assert_eq!(count_rows(&repo, "vehicles"), 20);
    assert_eq!(count_rows(&repo, "owners"), 1);
}

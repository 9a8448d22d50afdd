use car_valuation::config::PipelineConfig;
use car_valuation::error::ErrorKind;
use car_valuation::features::{CategoricalEncoding, MinMaxScaler, NUMERIC_COLUMNS, project, transform};
use car_valuation::import::parse_listings;
use car_valuation::listing::{Observation, RawListing};
use car_valuation::models::{POLYNOMIAL_LABEL, RANDOM_FOREST_LABEL};
use car_valuation::service::{PredictionService, Query};
use car_valuation::store::{CsvListingStore, ListingStore, MemoryListingStore};
use chrono::NaiveDate;
use std::env;
use std::fs;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn temp_path(name: &str) -> String {
    format!("{}/{}", env::temp_dir().display(), name)
}

/// Fifty XC60 listings with prices that fall with mileage and age.
fn xc60_listings() -> Vec<RawListing> {
    (0..50u32)
        .map(|i| {
            let mileage = 10_000 + (i * 2_857) % 140_001;
            let year = 2008 + i % 12;
            let horsepower = 150 + (i % 5) * 20;
            let owners = 1 + i % 4;
            let gearbox = if i % 2 == 0 { "manual" } else { "automatic" };
            let fuel = if i % 3 == 0 { "diesel" } else { "petrol" };
            let price = 420_000 - mileage - (2020 - year) * 15_000 + horsepower * 200
                - owners * 3_000
                + if gearbox == "automatic" { 10_000 } else { 0 };

            RawListing {
                id: Some(format!("xc60-{i}")),
                url: Some(format!("https://example.test/xc60/{i}")),
                manufacturer: Some("Volvo".into()),
                model: Some("XC60".into()),
                price: Some(price.to_string()),
                mileage: Some(mileage.to_string()),
                horsepower: Some(horsepower.to_string()),
                gearbox: Some(gearbox.into()),
                first_registration_date: Some(format!("{year}-0{}-15", 1 + i % 9)),
                owner_count: Some(owners.to_string()),
                fuel: Some(fuel.into()),
            }
        })
        .collect()
}

fn observation() -> Observation {
    Observation {
        mileage: 11_000,
        horsepower: 80,
        first_registration_date: "2011-01-01".into(),
        fuel: "petrol".into(),
        gearbox: "manual".into(),
        owner_count: 2,
    }
}

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.seed = Some(2024);
    config.forest.n_estimators = 50;
    config
}

fn service() -> PredictionService<MemoryListingStore> {
    let mut store = MemoryListingStore::new();
    store.insert(&xc60_listings()).unwrap();
    PredictionService::new(store, config()).unwrap()
}

#[test]
fn test_end_to_end_valuation() {
    let valuation = service()
        .predict_at(&Query::new("Volvo", "XC60"), &observation(), None, today())
        .unwrap();

    assert_eq!(valuation.sample_size, 50);
    assert!(valuation.predicted_price.is_finite());
    assert_eq!(valuation.predicted_price % 1000.0, 0.0);
    assert_eq!(valuation.error_margin % 100.0, 0.0);
    assert!(valuation.error_margin >= 0.0);
    assert!(valuation.mape.is_finite() && valuation.mape >= 0.0);
    assert!(
        [RANDOM_FOREST_LABEL, POLYNOMIAL_LABEL].contains(&valuation.winning_strategy_label.as_str())
    );
}

#[test]
fn test_seeded_valuation_is_reproducible() {
    let svc = service();
    let query = Query::new("volvo", "xc60");

    let first = svc.predict_at(&query, &observation(), None, today()).unwrap();
    let second = svc.predict_at(&query, &observation(), None, today()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_pair_is_insufficient_data() {
    let err = service()
        .predict_at(&Query::new("Volvo", "V90"), &observation(), None, today())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[test]
fn test_schema_ignores_record_order() {
    let listings = xc60_listings();
    let mut reversed = listings.clone();
    reversed.reverse();

    let a = transform(&listings, today()).unwrap();
    let b = transform(&reversed, today()).unwrap();

    assert_eq!(a.schema, b.schema);
    assert_eq!(
        a.schema.columns(),
        [
            "mileage",
            "horsepower",
            "car_age",
            "owner_count",
            "gearbox_manual",
            "fuel_petrol"
        ]
    );
}

#[test]
fn test_projection_matches_training_layout() {
    let features = transform(&xc60_listings(), today()).unwrap();
    let mut x = features.x.clone();
    let scaler = MinMaxScaler::fit(&x, NUMERIC_COLUMNS.len()).unwrap();
    scaler.transform(&mut x);

    let row = project(&observation(), &features.schema, &scaler, today()).unwrap();
    assert_eq!(row.len(), x.ncols());

    let manual = features.schema.position("gearbox_manual").unwrap();
    let petrol = features.schema.position("fuel_petrol").unwrap();
    assert_eq!(row[manual], 1.0);
    assert_eq!(row[petrol], 1.0);

    // 11 000 km sits just above the smallest training mileage.
    assert!(row[0] > 0.0 && row[0] < 0.05);
}

#[test]
fn test_unseen_level_projects_to_zeros() {
    let features = transform(&xc60_listings(), today()).unwrap();
    let scaler = MinMaxScaler::fit(&features.x, NUMERIC_COLUMNS.len()).unwrap();

    let mut electric = observation();
    electric.fuel = "electric".into();
    let row = project(&electric, &features.schema, &scaler, today()).unwrap();

    let petrol = features.schema.position("fuel_petrol").unwrap();
    assert_eq!(row[petrol], 0.0);
}

#[test]
fn test_single_level_categorical_rejects_other_level() {
    let listings: Vec<RawListing> = xc60_listings()
        .into_iter()
        .map(|mut l| {
            l.gearbox = Some("automatic".into());
            l
        })
        .collect();

    let features = transform(&listings, today()).unwrap();
    assert!(matches!(
        features.schema.encoding(car_valuation::features::Categorical::Gearbox),
        CategoricalEncoding::Dropped { .. }
    ));

    let mut store = MemoryListingStore::new();
    store.insert(&listings).unwrap();
    let svc = PredictionService::new(store, config()).unwrap();

    let err = svc
        .predict_at(&Query::new("Volvo", "XC60"), &observation(), None, today())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
}

#[test]
fn test_import_into_csv_store_then_predict() {
    let path = temp_path("car_valuation_test_integration_store.csv");
    let _ = fs::remove_file(&path);

    let mut export = String::from(
        "id\turl\tprice\tmileage\thp\tgearbox\ttraffic_date\towners\tfuel\tmanufacturer\tmodel\n",
    );
    for l in xc60_listings() {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        export.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            field(&l.id),
            field(&l.url),
            field(&l.price),
            field(&l.mileage),
            field(&l.horsepower),
            field(&l.gearbox),
            field(&l.first_registration_date),
            field(&l.owner_count),
            field(&l.fuel),
            field(&l.manufacturer),
            field(&l.model),
        ));
    }

    let listings = parse_listings(export.as_bytes(), b'\t').unwrap();
    let mut store = CsvListingStore::new(&path);
    let summary = store.insert(&listings).unwrap();
    assert_eq!(summary.inserted, 50);

    // Re-importing the same export adds nothing.
    let again = store.insert(&listings).unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.duplicates, 50);

    let svc = PredictionService::new(CsvListingStore::new(&path), config()).unwrap();
    let valuation = svc
        .predict_at(&Query::new("Volvo", "XC60"), &observation(), Some(0.2), today())
        .unwrap();
    assert_eq!(valuation.sample_size, 50);

    fs::remove_file(&path).unwrap();
}

use std::io::Write;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Workbook};

use plan_viewer::data::filter::{available_values, date_bounds, filter, DateRange, FilterSpec};
use plan_viewer::data::loader::{load, load_file, FileFormat, LoadError, LoaderOptions};
use plan_viewer::data::model::{CellValue, ColumnType, Table};
use plan_viewer::data::pipeline::{apply, preview};
use plan_viewer::data::sort::{sort, SortSpec};

const DOMAIN: &str = "Domaines de dépense";
const LINE: &str = "Ligne budgétaire";
const START: &str = "Date de début";

const PLAN_CSV: &str = "Domaines de dépense;Ligne budgétaire;Date de début\n\
                        A;L1;01/01/2023\n\
                        B;L2;15/06/2023\n\
                        A;L1;20/12/2023\n";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> CellValue {
    CellValue::Date(ymd(y, m, d).and_hms_opt(0, 0, 0).unwrap())
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn plan() -> Table {
    load(PLAN_CSV.as_bytes(), FileFormat::Csv, &LoaderOptions::default()).unwrap()
}

fn rows(table: &Table) -> Vec<Vec<CellValue>> {
    (0..table.num_rows())
        .map(|i| table.row(i).unwrap().into_iter().cloned().collect())
        .collect()
}

#[test]
fn domain_then_date_range() {
    let table = plan();

    let by_domain = FilterSpec::new().with_values(DOMAIN, [text("A")]);
    let filtered = filter(&table, &by_domain);
    assert_eq!(filtered.num_rows(), 2);

    let by_both = by_domain.with_date_range(START, DateRange::from_dates(ymd(2023, 1, 1), ymd(2023, 6, 1)));
    let filtered = filter(&table, &by_both);
    assert_eq!(
        rows(&filtered),
        vec![vec![text("A"), text("L1"), date(2023, 1, 1)]]
    );
}

#[test]
fn sort_by_start_date() {
    let sorted = sort(&plan(), &SortSpec::ascending(START));
    assert_eq!(
        sorted.column(START).unwrap().values,
        vec![date(2023, 1, 1), date(2023, 6, 15), date(2023, 12, 20)]
    );
}

#[test]
fn apply_filters_then_sorts() {
    let spec = FilterSpec::new().with_values(LINE, [text("L1")]);
    let out = apply(&plan(), &spec, Some(&SortSpec::descending(START)));
    assert_eq!(
        out.column(START).unwrap().values,
        vec![date(2023, 12, 20), date(2023, 1, 1)]
    );
    assert_eq!(apply(&plan(), &FilterSpec::new(), None), plan());
}

#[test]
fn preview_keeps_first_rows() {
    let mut csv = String::from("n;Date de fin\n");
    for i in 0..25 {
        csv.push_str(&format!("{i};01/01/2024\n"));
    }
    let table = load(csv.as_bytes(), FileFormat::Csv, &LoaderOptions::default()).unwrap();
    let head = preview(&table, 10);
    assert_eq!(head.num_rows(), 10);
    assert_eq!(head.column("n").unwrap().values[9], CellValue::Integer(9));
    assert_eq!(preview(&head, 10), head);
}

#[test]
fn full_value_set_keeps_row_count() {
    let table = plan();
    let all = available_values(&table, DOMAIN).unwrap();
    let out = filter(&table, &FilterSpec::new().with_values(DOMAIN, all));
    assert_eq!(out.num_rows(), table.num_rows());
}

#[test]
fn no_allowlisted_columns_means_no_dates() {
    let table = load(
        "Domaines de dépense;Début;Montant\nA;01/01/2023;12\nB;02/02/2023;7\n".as_bytes(),
        FileFormat::Csv,
        &LoaderOptions::default(),
    )
    .unwrap();
    assert!(table
        .columns()
        .iter()
        .all(|c| c.column_type != ColumnType::Date));
    assert_eq!(date_bounds(&table, START), None);
}

#[test]
fn unparseable_dates_become_missing() {
    let table = load(
        "Date_Paiement;x\n31/12/2023;1\nnot-a-date;2\n".as_bytes(),
        FileFormat::Csv,
        &LoaderOptions::default(),
    )
    .unwrap();
    assert_eq!(
        table.column("Date_Paiement").unwrap().values,
        vec![date(2023, 12, 31), CellValue::Null]
    );
}

#[test]
fn full_date_range_keeps_every_dated_row() {
    let table = load(
        "Date de début;n\n01/01/2023;1\n20/12/2023 23:59:59.9995;2\n".as_bytes(),
        FileFormat::Csv,
        &LoaderOptions::default(),
    )
    .unwrap();
    let (lo, hi) = date_bounds(&table, START).unwrap();
    let spec = FilterSpec::new().with_date_range(START, DateRange::from_dates(lo.date(), hi.date()));
    assert_eq!(filter(&table, &spec), table);
}

#[test]
fn blank_headers_match_across_readers() {
    let from_csv = load("a;b;\n1;2;3\n".as_bytes(), FileFormat::Csv, &LoaderOptions::default()).unwrap();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "a").unwrap();
    sheet.write_string(0, 1, "b").unwrap();
    for col in 0..3u16 {
        sheet.write_number(1, col, f64::from(col + 1)).unwrap();
    }
    let from_xlsx = load(
        &workbook.save_to_buffer().unwrap(),
        FileFormat::Spreadsheet,
        &LoaderOptions::default(),
    )
    .unwrap();

    assert_eq!(from_csv.column_names(), vec!["a", "b", "Unnamed: 2"]);
    assert_eq!(from_xlsx.column_names(), from_csv.column_names());
}

#[test]
fn load_file_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PLAN_CSV.as_bytes()).unwrap();
    let table = load_file(file.path(), FileFormat::Csv, &LoaderOptions::default()).unwrap();
    assert_eq!(table, plan());

    let missing = load_file(
        &file.path().with_extension("gone"),
        FileFormat::Csv,
        &LoaderOptions::default(),
    );
    assert!(matches!(missing, Err(LoadError::Io(_))));
}

fn plan_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, DOMAIN).unwrap();
    sheet.write_string(0, 1, LINE).unwrap();
    sheet.write_string(0, 2, START).unwrap();
    sheet.write_string(0, 3, "Montant").unwrap();

    sheet.write_string(1, 0, "A").unwrap();
    sheet.write_string(1, 1, "L1").unwrap();
    // 2023-12-31 as an Excel serial day number
    sheet.write_number_with_format(1, 2, 45291.0, &date_format).unwrap();
    sheet.write_number(1, 3, 1500.5).unwrap();

    sheet.write_string(2, 0, "B").unwrap();
    sheet.write_string(2, 1, "L2").unwrap();
    sheet.write_string(2, 2, "15/06/2023").unwrap();
    sheet.write_number(2, 3, 20.0).unwrap();

    sheet.write_string(3, 0, "A").unwrap();
    sheet.write_string(3, 1, "L1").unwrap();
    sheet.write_string(3, 2, "not-a-date").unwrap();
    sheet.write_number(3, 3, 7.0).unwrap();

    workbook.save_to_buffer().unwrap()
}

#[test]
fn spreadsheet_dates_are_coerced() {
    let table = load(&plan_workbook(), FileFormat::Spreadsheet, &LoaderOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec![DOMAIN, LINE, START, "Montant"]);
    assert_eq!(table.num_rows(), 3);

    let start = table.column(START).unwrap();
    assert_eq!(start.column_type, ColumnType::Date);
    assert_eq!(
        start.values,
        vec![date(2023, 12, 31), date(2023, 6, 15), CellValue::Null]
    );
    assert_eq!(table.column("Montant").unwrap().column_type, ColumnType::Number);

    let spec = FilterSpec::new()
        .with_values(DOMAIN, [text("A")])
        .with_date_range(START, DateRange::from_dates(ymd(2023, 12, 1), ymd(2023, 12, 31)));
    assert_eq!(filter(&table, &spec).num_rows(), 1);
}

#[test]
fn csv_bytes_are_not_a_spreadsheet() {
    let err = load(PLAN_CSV.as_bytes(), FileFormat::Spreadsheet, &LoaderOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Spreadsheet(_)), "got {err:?}");
}

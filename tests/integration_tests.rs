use chat_log_restructurer::*;
use std::fs;
use std::path::{Path, PathBuf};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("fixture should be writable");
    path
}

fn text(value: &str) -> CellValue {
    CellValue::text(value)
}

const SUPPORT_EXPORT: &str = "\
ChatID,Agent,Message_No_3,Message_No_1,Message_No_2,Message_No_4
1001,alice,Let me check that for you,Hello! How can I help?,My order is late,
1002,bob,,Hi there,,
1003,carol,Done,Welcome,   ,Thanks
";

const RESPONSE_EXPORT: &str = "\
ChatID,ActualOrExpected,Intent,Message_No_1,Message_No_2,Message_No_3
A1,Expected,refund,Hello,I want a refund,Refund issued
A1,Actual,refund,Hello,I want a refund,Please hold
B2,Actual,billing,Hi,,
B2,Expected,greeting,Hi,Invoice?,Here is your invoice
C3,Expected,other,,,
";

#[test]
fn test_csv_file_gets_conversation_column() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "support.csv", SUPPORT_EXPORT);

    let processed = process_file(&input, &TransformConfig::default()).unwrap();
    assert_eq!(processed.format, InputFormat::Csv);
    assert_eq!(processed.status, ProcessingStatus::Processed { sheets: 1 });
    assert_eq!(processed.status_message(), "Successfully processed support.csv");

    let sheet = &processed.sheets[0];
    assert_eq!(sheet.processed.column_count(), sheet.original.column_count() + 1);
    assert_eq!(sheet.processed.row_count(), 3);
    assert_eq!(
        sheet.processed.columns(),
        ["ChatID", "Agent", "Conversation", "Message_No_3", "Message_No_1", "Message_No_2", "Message_No_4"]
    );
    assert_eq!(
        sheet.processed.value(0, "Conversation"),
        Some(&text(
            "Bot: Hello! How can I help?\nUser: My order is late\nBot: Let me check that for you"
        ))
    );
    assert_eq!(sheet.processed.value(1, "Conversation"), Some(&text("Bot: Hi there")));
    assert_eq!(
        sheet.processed.value(2, "Conversation"),
        Some(&text("Bot: Welcome\nBot: Done\nUser: Thanks"))
    );
    // Chat ids are read verbatim as text
    assert_eq!(sheet.processed.value(0, "ChatID"), Some(&text("1001")));
}

#[test]
fn test_written_output_matches_processed_frame() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "support.csv", SUPPORT_EXPORT);
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let config = TransformConfig::default();
    let processed = process_file(&input, &config).unwrap();
    let written = processed.write_output(&out_dir).unwrap();

    assert_eq!(written, out_dir.join("processed_support.csv"));
    let reread = read_csv_path(&written, &config).unwrap();
    assert_eq!(reread, processed.sheets[0].processed);
}

#[test]
fn test_second_pass_leaves_file_identical() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "support.csv", SUPPORT_EXPORT);

    let config = TransformConfig::default();
    let first = process_file(&input, &config).unwrap();
    let first_csv = frame_to_csv_string(&first.sheets[0].processed).unwrap();

    let again = write_fixture(dir.path(), "again.csv", &first_csv);
    let second = process_file(&again, &config).unwrap();
    let second_csv = frame_to_csv_string(&second.sheets[0].processed).unwrap();

    assert_eq!(first_csv, second_csv);
}

#[test]
fn test_csv_without_message_columns_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "plain.csv", "id,text\n1,hello\n");

    let processed = process_file(&input, &TransformConfig::default()).unwrap();
    assert_eq!(processed.status, ProcessingStatus::NoMessageColumns);
    assert_eq!(
        processed.status_message(),
        "No Message_No columns found in plain.csv"
    );
    assert_eq!(processed.sheets[0].processed, processed.sheets[0].original);
    assert!(processed.preview().1.is_none());
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "notes.txt", "id\n1\n");

    let err = process_file(&input, &TransformConfig::default()).unwrap_err();
    assert!(matches!(err, RestructureError::UnsupportedFormat(_)));
}

#[test]
fn test_summary_for_processed_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "support.csv", SUPPORT_EXPORT);

    let config = TransformConfig::default();
    let processed = process_file(&input, &config).unwrap();
    let summary = processed.summary(&config).unwrap();

    assert_eq!(
        summary.message_columns,
        vec!["Message_No_1", "Message_No_2", "Message_No_3", "Message_No_4"]
    );
    assert_eq!(
        summary.to_string(),
        "Found 4 message columns: Message_No_1, Message_No_2, Message_No_3, Message_No_4\n\
         Added new 'Conversation' column to the left of Message_No_3"
    );
}

#[test]
fn test_consolidate_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "responses.csv", RESPONSE_EXPORT);

    let consolidated = consolidate_file(&input, &TransformConfig::default()).unwrap();
    assert_eq!(consolidated.sheets.len(), 1);

    let sheet = &consolidated.sheets[0];
    let frame = &sheet.frame;
    assert_eq!(frame.row_count(), 3);
    assert_eq!(
        frame.columns(),
        ["ChatID", "Intent", "Message_No_1", "Message_No_2", "Message_No_3", "Expected", "Actual"]
    );

    assert_eq!(frame.value(0, "ChatID"), Some(&text("A1")));
    assert_eq!(frame.value(0, "Expected"), Some(&text("Refund issued")));
    assert_eq!(frame.value(0, "Actual"), Some(&text("Please hold")));

    // Base data comes from the first B2 row, the Actual row
    assert_eq!(frame.value(1, "Intent"), Some(&text("billing")));
    assert_eq!(frame.value(1, "Expected"), Some(&text("Here is your invoice")));
    assert_eq!(frame.value(1, "Actual"), Some(&text("Hi")));

    assert_eq!(frame.value(2, "Expected"), Some(&CellValue::Missing));
    assert_eq!(frame.value(2, "Actual"), Some(&CellValue::Missing));

    assert_eq!(sheet.report.input_rows, 5);
    assert_eq!(sheet.report.chat_ids, 3);
    assert_eq!(sheet.report.rows_without_message, 1);
}

#[test]
fn test_consolidate_file_without_chat_id_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(
        dir.path(),
        "broken.csv",
        "ActualOrExpected,Message_No_1\nExpected,hello\n",
    );

    let err = consolidate_file(&input, &TransformConfig::default()).unwrap_err();
    assert!(err.is_schema_error());
    assert!(err.to_string().contains("ChatID"));
}

#[test]
fn test_consolidated_output_round_trips_through_csv() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "responses.csv", RESPONSE_EXPORT);
    let config = TransformConfig::default();

    let consolidated = consolidate_file(&input, &config).unwrap();
    let written = consolidated.write_output(dir.path()).unwrap();
    assert_eq!(written, dir.path().join("processed_responses.csv"));

    let reread = read_csv_path(&written, &config).unwrap();
    assert_eq!(reread, consolidated.sheets[0].frame);
}

#[test]
fn test_distinct_chat_ids_are_never_merged() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(
        dir.path(),
        "ids.csv",
        "ChatID,ActualOrExpected,Message_No_1\n\
         9007199254740993,Expected,a\n\
         9007199254740992,Actual,b\n\
         01,Expected,c\n\
         1,Actual,d\n\
         abc,Expected,e\n",
    );

    let consolidated = consolidate_file(&input, &TransformConfig::default()).unwrap();
    let frame = &consolidated.sheets[0].frame;

    assert_eq!(frame.row_count(), 5);
    let ids: Vec<String> = frame.rows().iter().map(|row| row[0].to_string()).collect();
    assert_eq!(
        ids,
        vec!["9007199254740993", "9007199254740992", "01", "1", "abc"]
    );
    assert_eq!(frame.value(0, "Expected"), Some(&text("a")));
    assert_eq!(frame.value(1, "Actual"), Some(&text("b")));
}

/// Three sheets: two chat exports and one sheet without message columns.
fn write_workbook_fixture(path: &Path) {
    let mut workbook = Workbook::new();

    for (sheet, rows) in [
        (
            "Web",
            vec![(1001.0, "Welcome", "Where is my order?"), (1002.0, "Hi", "Refund please")],
        ),
        ("App", vec![(2001.0, "Hello", "Reset my password")]),
    ] {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        worksheet.write_string(0, 0, "ChatID").unwrap();
        worksheet.write_string(0, 1, "Message_No_2").unwrap();
        worksheet.write_string(0, 2, "Message_No_1").unwrap();
        for (offset, (id, bot, user)) in rows.into_iter().enumerate() {
            let row = offset as u32 + 1;
            worksheet.write_number(row, 0, id).unwrap();
            worksheet.write_string(row, 1, user).unwrap();
            worksheet.write_string(row, 2, bot).unwrap();
        }
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "Owner").unwrap();
    notes.write_string(0, 1, "Remark").unwrap();
    notes.write_string(1, 0, "ops").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn test_workbook_sheets_are_processed_and_written_as_one_workbook() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.xlsx");
    write_workbook_fixture(&input);

    let config = TransformConfig::default();
    let processed = process_file(&input, &config).unwrap();

    assert_eq!(processed.format, InputFormat::Workbook);
    assert_eq!(processed.status, ProcessingStatus::Processed { sheets: 2 });
    assert_eq!(
        processed.status_message(),
        "Successfully processed 2 sheet(s) in export.xlsx"
    );

    let names: Vec<&str> = processed.sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(names, vec!["Web", "App", "Notes"]);

    let web = &processed.sheets[0].processed;
    assert_eq!(web.columns(), ["ChatID", "Conversation", "Message_No_2", "Message_No_1"]);
    assert_eq!(web.value(0, "ChatID"), Some(&CellValue::Number(1001.0)));
    assert_eq!(
        web.value(0, "Conversation"),
        Some(&text("Bot: Welcome\nUser: Where is my order?"))
    );

    let notes = &processed.sheets[2];
    assert_eq!(notes.outcome, BuildOutcome::NoMessageColumns);
    assert_eq!(notes.processed.value(0, "Remark"), Some(&CellValue::Missing));

    let written = processed.write_output(dir.path()).unwrap();
    assert_eq!(written, dir.path().join("processed_export.xlsx"));
    assert_eq!(written.file_name().unwrap().to_string_lossy(), processed.output_name());

    let reread = read_workbook(&written).unwrap();
    assert_eq!(reread.len(), 3);
    for ((name, frame), sheet) in reread.iter().zip(&processed.sheets) {
        assert_eq!(name, &sheet.name);
        assert_eq!(frame, &sheet.processed);
    }
}

#[test]
fn test_consolidate_workbook_requires_keys_on_every_sheet() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.xlsx");
    write_workbook_fixture(&input);

    let err = consolidate_file(&input, &TransformConfig::default()).unwrap_err();
    assert!(err.is_schema_error());
    assert!(err.to_string().contains("ActualOrExpected"));
}

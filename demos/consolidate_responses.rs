use chat_log_restructurer::{
    consolidate_responses, frame_to_csv_string, CellValue, Frame,
};

fn main() {
    env_logger::init();

    let columns = ["ChatID", "ActualOrExpected", "Message_No_1", "Message_No_3", "Message_No_5"]
        .iter()
        .map(|name| name.to_string())
        .collect();

    let frame = Frame::from_rows(
        columns,
        vec![
            vec![
                CellValue::text("chat-1"),
                CellValue::text("Expected"),
                CellValue::Missing,
                CellValue::text("A"),
                CellValue::Missing,
            ],
            vec![
                CellValue::text("chat-1"),
                CellValue::text("Actual"),
                CellValue::text("B"),
                CellValue::Missing,
                CellValue::text("C"),
            ],
            vec![
                CellValue::text("chat-2"),
                CellValue::text("Actual"),
                CellValue::text("only actual"),
                CellValue::Missing,
                CellValue::Missing,
            ],
        ],
    );

    let consolidated = consolidate_responses(&frame).expect("required columns are present");

    println!("Input rows: {}", frame.row_count());
    println!("Chat ids:   {}", consolidated.row_count());
    println!();
    print!(
        "{}",
        frame_to_csv_string(&consolidated).expect("in-memory CSV encoding should succeed")
    );

    let missing_id = Frame::new(vec!["ActualOrExpected".to_string(), "Message_No_1".to_string()]);
    match consolidate_responses(&missing_id) {
        Ok(_) => println!("unexpectedly consolidated a frame without ChatID"),
        Err(err) => println!("\nRejected frame without ChatID: {}", err),
    }
}

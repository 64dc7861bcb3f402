
use bsm_batch::{
    generate, generate_csv, price, price_with, run_batch, run_csv_batch, BatchConfig,
    CancellationFlag, CsvRecordSink, CsvRecordSource, InvalidReason, PutLeg, RawRecord,
    RecordSink, ResultWriter, ValuationError, Variation,
};
use std::cell::Cell;
use std::io::Cursor;
use test_utils::{as_source, assert_close, raw_record, reference_contract, REFERENCE_PUT_POS_D2};

/// Generate `count` copies of `kind`'s reference contract into an in-memory CSV file.
fn generated_csv(kind: &str, count: usize, variation: &Variation) -> Vec<u8> {
    let mut sink = CsvRecordSink::from_writer(Vec::new());
    let written = generate(&reference_contract(kind), count, variation, &mut sink).unwrap();
    assert_eq!(written, count);
    sink.into_inner().unwrap()
}

/// Generating N records and reading them back prices every row like the template.
#[test]
fn test_generate_then_read_round_trip() {
    let n = 1_000;
    for kind in ["call", "put"] {
        let template = reference_contract(kind);
        let direct = price(&template).unwrap();
        let bytes = generated_csv(kind, n, &Variation::none());

        let mut rows = 0;
        for (i, result) in run_batch(CsvRecordSource::from_reader(Cursor::new(bytes))).enumerate()
        {
            assert_eq!(result.row, i);
            let valuation = result.outcome.expect("generated row must be valid");
            assert_eq!(valuation.contract, template);
            assert_eq!(valuation.price, direct);
            rows += 1;
        }
        assert_eq!(rows, n);
    }
}

/// Jittered records survive the CSV round trip bit-for-bit.
#[test]
fn test_jittered_round_trip_is_exact() {
    let variation = Variation::spot_jitter(0.3, Some(42));

    let mut in_memory: Vec<RawRecord> = Vec::new();
    generate(&reference_contract("call"), 200, &variation, &mut in_memory).unwrap();
    let bytes = generated_csv("call", 200, &variation);

    let from_csv: Vec<_> = run_batch(CsvRecordSource::from_reader(Cursor::new(bytes))).collect();
    let from_memory: Vec<_> = run_batch(as_source(in_memory)).collect();
    assert_eq!(from_csv.len(), 200);

    let mut distinct_spots = 0;
    for (a, b) in from_csv.iter().zip(&from_memory) {
        let a = a.outcome.as_ref().unwrap();
        let b = b.outcome.as_ref().unwrap();
        assert_eq!(a.contract, b.contract);
        assert_eq!(a.price.to_bits(), b.price.to_bits());

        let spot = a.contract.spot();
        assert!((0.7..=1.3).contains(&spot), "spot {spot} outside jitter band");
        if spot != 1.0 {
            distinct_spots += 1;
        }
    }
    assert!(distinct_spots > 0, "jitter should move the spot");
}

/// The same seed produces the same records.
#[test]
fn test_seeded_generation_is_reproducible() {
    let variation = Variation::spot_jitter(0.1, Some(7));
    assert_eq!(
        generated_csv("put", 50, &variation),
        generated_csv("put", 50, &variation)
    );
}

/// A malformed row yields one error at its position; every other row is priced.
#[test]
fn test_malformed_row_does_not_stop_the_stream() {
    let n = 10;
    let bad_row = 4;
    let records: Vec<RawRecord> = (0..n)
        .map(|i| raw_record(if i == bad_row { "bond" } else { "call" }))
        .collect();

    let mut valuations = run_batch(as_source(records));
    let results: Vec<_> = valuations.by_ref().collect();

    assert_eq!(results.len(), n);
    let failures: Vec<_> = results.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].row, bad_row);
    assert_eq!(
        failures[0].error().and_then(ValuationError::invalid_reason),
        Some(InvalidReason::UnsupportedKind)
    );

    let summary = valuations.summary();
    assert_eq!(summary.total, n);
    assert_eq!(summary.succeeded, n - 1);
    assert_eq!(summary.failures_for("unsupported_kind"), 1);
}

/// Every failure kind is attributed to its row and counted under its own label.
#[test]
fn test_summary_counts_each_reason() {
    let mut bad_volatility = raw_record("call");
    bad_volatility.volatility = "0".to_string();
    let mut bad_maturity = raw_record("put");
    bad_maturity.time_to_maturity = "-1".to_string();
    let mut bad_number = raw_record("call");
    bad_number.price = "1,0".to_string();

    let records = vec![
        raw_record("call"),
        bad_volatility,
        raw_record("CALL"),
        bad_maturity,
        bad_number,
        raw_record("put"),
    ];

    let summary = run_batch(as_source(records)).into_summary();
    assert_eq!(summary.total, 6);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures_for("non_positive_volatility"), 1);
    assert_eq!(summary.failures_for("unsupported_kind"), 1);
    assert_eq!(summary.failures_for("non_positive_maturity"), 1);
    assert_eq!(summary.failures_for("parse_error"), 1);
}

/// Rows the CSV layer cannot decode become source errors without ending the batch.
#[test]
fn test_csv_rows_with_wrong_field_count() {
    let csv = "\
option_type,price,strike,interest_rate,volatility,time_to_maturity,amount_underlying
call,1,0.9,0.015,0.2,1,1
put,1,0.9,0.015
put,1,0.9,0.015,0.2,1,2
";
    let results: Vec<_> = run_batch(CsvRecordSource::from_reader(csv.as_bytes())).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1].error(), Some(ValuationError::Source(_))));
    assert_eq!(results[2].row, 2);
    assert!(results[2].is_ok());
}

/// Columns are matched by header name, not position.
#[test]
fn test_csv_columns_in_any_order() {
    let csv = "\
amount_underlying,volatility,option_type,time_to_maturity,strike,interest_rate,price
1,0.2,call,1,0.9,0.015,1
";
    let results: Vec<_> = run_batch(CsvRecordSource::from_reader(csv.as_bytes())).collect();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].price(),
        Some(price(&reference_contract("call")).unwrap())
    );
}

/// Records are pulled from the source only as results are requested.
#[test]
fn test_pipeline_is_lazy() {
    let pulled = Cell::new(0usize);
    let source = (0..1_000_000).map(|_| {
        pulled.set(pulled.get() + 1);
        Ok(raw_record("call"))
    });

    let first: Vec<_> = run_batch(source).take(3).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(pulled.get(), 3);
}

#[test]
fn test_cancellation_stops_between_records() {
    let flag = CancellationFlag::new();
    let records: Vec<RawRecord> = (0..100).map(|_| raw_record("put")).collect();
    let mut valuations = run_batch(as_source(records)).with_cancellation(flag.clone());

    for _ in 0..10 {
        assert!(valuations.next().is_some());
    }
    flag.cancel();
    assert!(valuations.next().is_none());
    assert!(valuations.next().is_none());
    assert_eq!(valuations.summary().total, 10);
}

#[test]
fn test_put_leg_applies_to_whole_batch() {
    let records = vec![raw_record("put"), raw_record("call")];
    let results: Vec<_> = run_batch(as_source(records))
        .with_put_leg(PutLeg::PosD2)
        .collect();

    assert_close(
        results[0].price().unwrap(),
        REFERENCE_PUT_POS_D2,
        1e-12,
        "Φ(d2) put",
    );
    assert_eq!(
        results[1].price(),
        Some(price_with(&reference_contract("call"), PutLeg::PosD2).unwrap())
    );
}

/// Result rows carry the contract and value on success, the error text on failure.
#[test]
fn test_result_writer_output() {
    let records = vec![raw_record("call"), raw_record("straddle")];
    let mut writer = ResultWriter::from_writer(Vec::new());
    for result in run_batch(as_source(records)) {
        writer.write(&result).unwrap();
    }
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "row,option_type,price,strike,interest_rate,volatility,time_to_maturity,\
         amount_underlying,value,error"
    );
    assert!(lines[1].starts_with("0,call,1.0,0.9,0.015,0.2,1.0,1,0.14498531543"));
    assert!(lines[1].ends_with(','));
    assert_eq!(lines[2], "1,,,,,,,,,invalid option: unsupported_kind");
}

/// A sink that rejects writes surfaces the error to the generator's caller.
#[test]
fn test_generate_propagates_sink_errors() {
    struct FullSink(usize);

    impl RecordSink for FullSink {
        fn write_record(&mut self, _record: &RawRecord) -> Result<(), ValuationError> {
            if self.0 == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.0 -= 1;
            Ok(())
        }
    }

    let mut sink = FullSink(5);
    let err = generate(&reference_contract("call"), 10, &Variation::none(), &mut sink)
        .unwrap_err();
    assert_eq!(err.reason_label(), "io_error");
}

#[test]
fn test_generate_zero_records() {
    let mut records: Vec<RawRecord> = Vec::new();
    let written = generate(&reference_contract("put"), 0, &Variation::none(), &mut records)
        .unwrap();
    assert_eq!(written, 0);
    assert!(records.is_empty());
}

/// An unusable spot jitter is refused before any record reaches the sink.
#[test]
fn test_generate_rejects_out_of_range_jitter() {
    let template = reference_contract("call");
    for jitter in [f64::INFINITY, 1e308, 1.0, 1.5, f64::NAN, -0.1, f64::NEG_INFINITY] {
        let mut records: Vec<RawRecord> = Vec::new();
        let variation = Variation::spot_jitter(jitter, Some(1));
        let result = generate(&template, 10, &variation, &mut records);

        assert!(
            matches!(result, Err(ValuationError::InvalidVariation { .. })),
            "jitter={jitter}: {result:?}"
        );
        assert_eq!(result.unwrap_err().reason_label(), "invalid_variation");
        assert!(records.is_empty(), "jitter={jitter} wrote {} records", records.len());
    }

    let mut records: Vec<RawRecord> = Vec::new();
    let variation = Variation::spot_jitter(0.999, Some(1));
    assert_eq!(generate(&template, 100, &variation, &mut records).unwrap(), 100);
}

/// Config-driven generation and valuation through real files.
#[test]
fn test_csv_drivers_round_trip_through_files() {
    let dir = std::env::temp_dir().join(format!("bsm-batch-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let text = format!(
        r#"
        input = '{}'
        output = '{}'
        progress_interval = 100

        [generation]
        count = 500
        "#,
        dir.join("options.csv").display(),
        dir.join("values.csv").display(),
    );
    let config = BatchConfig::from_toml_str(&text).unwrap();

    assert_eq!(generate_csv(&config).unwrap(), 500);
    let summary = run_csv_batch(&config).unwrap();
    assert_eq!(summary.total, 500);
    assert_eq!(summary.succeeded, 500);

    let values = std::fs::read_to_string(dir.join("values.csv")).unwrap();
    assert_eq!(values.lines().count(), 501);

    std::fs::remove_dir_all(&dir).unwrap();
}

/// A TOML `inf` jitter is a configuration error, reported before the input file is created.
#[test]
fn test_generate_csv_rejects_infinite_jitter() {
    let dir = std::env::temp_dir().join(format!("bsm-batch-jitter-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("options.csv");

    let text = format!(
        r#"
        input = '{}'

        [generation]
        count = 10
        spot_jitter = inf
        "#,
        input.display(),
    );
    let config = BatchConfig::from_toml_str(&text).unwrap();
    assert!(config.generation.spot_jitter.is_infinite());

    let err = generate_csv(&config).unwrap_err();
    let cause = err.downcast_ref::<ValuationError>();
    assert!(
        matches!(cause, Some(ValuationError::InvalidVariation { .. })),
        "{err:#}"
    );
    assert!(!input.exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

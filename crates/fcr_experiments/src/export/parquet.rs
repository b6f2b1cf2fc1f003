use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::SimulationResult;

pub(crate) fn export_to_parquet_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(
    results: &[SimulationResult],
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    let arrays = build_arrays(results);

    RecordBatch::try_new(schema, arrays)
}

fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("total_incidents", DataType::UInt64, false),
        Field::new("total_officers", DataType::UInt64, false),
        Field::new("attended_incidents", DataType::UInt64, false),
        Field::new("cancelled_incidents", DataType::UInt64, false),
        Field::new("no_response_incidents", DataType::UInt64, false),
        Field::new("creations_dropped", DataType::UInt64, false),
        Field::new("attendance_rate", DataType::Float64, false),
        Field::new("avg_response_time_ms", DataType::Float64, false),
        Field::new("median_response_time_ms", DataType::Float64, false),
        Field::new("p90_response_time_ms", DataType::Float64, false),
        Field::new("avg_time_to_assign_ms", DataType::Float64, false),
        Field::new("median_time_to_assign_ms", DataType::Float64, false),
        Field::new("p90_time_to_assign_ms", DataType::Float64, false),
        Field::new("avg_immediate_response_ms", DataType::Float64, false),
        Field::new("p90_immediate_response_ms", DataType::Float64, false),
        Field::new("incidents_per_officer", DataType::Float64, false),
    ])
}

fn build_arrays(results: &[SimulationResult]) -> Vec<ArrayRef> {
    vec![
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.total_incidents as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.total_officers as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.attended_incidents as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.cancelled_incidents as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.no_response_incidents as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(
            results
                .iter()
                .map(|r| r.creations_dropped as u64)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.attendance_rate)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.avg_response_time_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.median_response_time_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.p90_response_time_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.avg_time_to_assign_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.median_time_to_assign_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.p90_time_to_assign_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.avg_immediate_response_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.p90_immediate_response_ms)
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            results
                .iter()
                .map(|r| r.incidents_per_officer)
                .collect::<Vec<_>>(),
        )),
    ]
}

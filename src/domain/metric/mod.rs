pub mod kpi_series;

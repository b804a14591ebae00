//! Charts module - Chart rendering

mod renderer;

pub use renderer::{
    plot_multi_trace, plot_result_scatter, plot_single_trace, ChartError, ResultParam,
    PLOT_WIDTH, PLOT_HEIGHT,
};

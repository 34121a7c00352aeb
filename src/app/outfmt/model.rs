use crate::portfolio::render::RenderTable;

pub enum OutputType {
    Gains,
    YearlyGains,
}

pub type Error = String;

pub trait AcbWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error>;
}

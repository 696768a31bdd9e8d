use crate::convert_pipeline::common::error::Result;

/// Destination for finished depth slices.
///
/// `data` is one pixel-interleaved `[y][x][channel]` slice. `page` is
/// 1-based; callers must emit every page of a timepoint exactly once, in
/// increasing depth order, with `page_total` fixed at the slice count.
pub trait PageSink {
    fn write_page(
        &mut self,
        width: usize,
        height: usize,
        channels: usize,
        page: usize,
        page_total: usize,
        data: &[u16],
    ) -> Result<()>;
}

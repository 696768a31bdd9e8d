//! Device-offloaded strategy.
//!
//! The interleave gather is one independent move per voxel per channel, so
//! it maps onto a CUDA kernel with one thread per voxel. Each channel gets
//! its own stream ordering transfer before kernel; a join over all channel
//! streams gates the readback.

use hdf5::Group;

use crate::convert_pipeline::common::error::{ConversionError, Result};
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::tiff::writer::PageSink;

/// Device buffers are pre-sized per channel.
#[cfg_attr(not(feature = "cuda"), allow(dead_code))]
pub(super) const MAX_CHANNELS: usize = 5;

#[cfg(feature = "cuda")]
pub(super) fn convert(
    sink: &mut dyn PageSink,
    timepoint: &Group,
    dims: VolumeDims,
    channels: usize,
) -> Result<()> {
    use cudarc::driver::safe::{CudaContext, CudaSlice, CudaStream, LaunchConfig};
    use cudarc::nvrtc::compile_ptx;
    use std::sync::Arc;
    use tracing::debug;

    use crate::convert_pipeline::ims::reader::read_channel;

    const KERNEL: &str = r#"
extern "C" __global__ void interleave16(const unsigned short *chan,
                                        unsigned short *contig,
                                        unsigned int c,
                                        unsigned int xs,
                                        unsigned int ys,
                                        unsigned int zs,
                                        unsigned int nchan)
{
    unsigned int x = blockIdx.x * blockDim.x + threadIdx.x;
    unsigned int y = blockIdx.y * blockDim.y + threadIdx.y;
    unsigned int z = blockIdx.z;
    if (x >= xs || y >= ys || z >= zs)
        return;
    size_t voxel = ((size_t)z * ys + y) * xs + x;
    contig[voxel * nchan + c] = chan[voxel];
}
"#;

    if channels > MAX_CHANNELS {
        return Err(ConversionError::ChannelCapacity {
            count: channels,
            max: MAX_CHANNELS,
        });
    }

    let ctx = CudaContext::new(0).map_err(gpu_err)?;
    let ptx = compile_ptx(KERNEL).map_err(gpu_err)?;
    let module = ctx.load_module(ptx).map_err(gpu_err)?;
    let kernel = module.load_function("interleave16").map_err(gpu_err)?;

    let voxels = dims.voxels();
    let main_stream = ctx.default_stream();
    let mut d_contig = main_stream
        .alloc_zeros::<u16>(voxels * channels)
        .map_err(gpu_err)?;

    // Host copies stay alive until the join; the transfers are asynchronous.
    let mut host_volumes: Vec<Vec<u16>> = Vec::with_capacity(channels);
    let mut device_volumes: Vec<CudaSlice<u16>> = Vec::with_capacity(channels);
    let mut streams: Vec<Arc<CudaStream>> = Vec::with_capacity(channels);

    for channel in 0..channels {
        let mut host = vec![0u16; voxels];
        read_channel(timepoint, channel, &mut host, dims)?;

        let stream = ctx.new_stream().map_err(gpu_err)?;
        let device = stream.clone_htod(&host).map_err(gpu_err)?;

        host_volumes.push(host);
        device_volumes.push(device);
        streams.push(stream);
    }

    let cfg = LaunchConfig {
        grid_dim: (
            dims.x.div_ceil(32) as u32,
            dims.y.div_ceil(32) as u32,
            dims.z as u32,
        ),
        block_dim: (32, 32, 1),
        shared_mem_bytes: 0,
    };
    let (xs, ys, zs, nchan) = (
        dims.x as u32,
        dims.y as u32,
        dims.z as u32,
        channels as u32,
    );

    for channel in 0..channels {
        debug!(channel, "Dispatching interleave kernel");
        let c = channel as u32;
        let mut launch = streams[channel].launch_builder(&kernel);
        launch.arg(&device_volumes[channel]);
        launch.arg(&mut d_contig);
        launch.arg(&c);
        launch.arg(&xs);
        launch.arg(&ys);
        launch.arg(&zs);
        launch.arg(&nchan);
        unsafe { launch.launch(cfg) }.map_err(gpu_err)?;
    }

    // Full join over every channel's transfer + kernel before reading back.
    for stream in &streams {
        stream.synchronize().map_err(gpu_err)?;
    }

    let contig = main_stream.clone_dtoh(&d_contig).map_err(gpu_err)?;

    let page_len = dims.plane() * channels;
    for z in 0..dims.z {
        sink.write_page(
            dims.x,
            dims.y,
            channels,
            z + 1,
            dims.z,
            &contig[z * page_len..(z + 1) * page_len],
        )?;
    }

    Ok(())
}

#[cfg(feature = "cuda")]
fn gpu_err<E: std::fmt::Display>(e: E) -> ConversionError {
    ConversionError::Gpu(e.to_string())
}

#[cfg(not(feature = "cuda"))]
pub(super) fn convert(
    _sink: &mut dyn PageSink,
    _timepoint: &Group,
    _dims: VolumeDims,
    _channels: usize,
) -> Result<()> {
    Err(ConversionError::Gpu(
        "built without the \"cuda\" feature".into(),
    ))
}

use std::io::{Read, Write};

use wasmpipe_frame::{FrameConfig, FrameReader, FrameWriter};
use wasmpipe_transport::ChannelPaths;

use crate::error::Result;

type BoxedReader = Box<dyn Read + Send>;
type BoxedWriter = Box<dyn Write + Send>;

/// The one inbound reader and one outbound writer owned by a host instance.
///
/// Built once at startup and moved into the guest's store, so host calls
/// reach the channels through the store rather than process-wide state.
pub struct PipeSession {
    reader: FrameReader<BoxedReader>,
    writer: FrameWriter<BoxedWriter>,
}

impl PipeSession {
    /// Wrap an already-open inbound and outbound stream.
    pub fn new<R, W>(inbound: R, outbound: W, config: FrameConfig) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            reader: FrameReader::with_config(Box::new(inbound), config.clone()),
            writer: FrameWriter::with_config(Box::new(outbound), config),
        }
    }

    /// Open both channel pipes (outbound first) and wrap them.
    pub fn open(paths: &ChannelPaths, config: FrameConfig) -> Result<Self> {
        let (inbound, outbound) = paths.open()?;
        Ok(Self::new(inbound, outbound, config))
    }

    /// The inbound frame reader.
    pub fn reader_mut(&mut self) -> &mut FrameReader<BoxedReader> {
        &mut self.reader
    }

    /// The outbound frame writer.
    pub fn writer_mut(&mut self) -> &mut FrameWriter<BoxedWriter> {
        &mut self.writer
    }

    /// Frames delivered to the guest so far.
    pub fn frames_read(&self) -> u64 {
        self.reader.frames_read()
    }

    /// Frames emitted by the guest so far.
    pub fn frames_written(&self) -> u64 {
        self.writer.frames_written()
    }
}

impl std::fmt::Debug for PipeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeSession")
            .field("frames_read", &self.frames_read())
            .field("frames_written", &self.frames_written())
            .finish()
    }
}

use std::{
    fs,
    io::{self, Read, Seek},
    ops::RangeInclusive,
    path::PathBuf,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender};
use xz2::read::XzDecoder;

/// Bytes per on-disk record: little-endian `addr: u64`, `size: u32`, and
/// four bytes of padding.
pub const RECORD_SIZE: usize = 16;

/// One memory reference: effective byte address and access size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    pub addr: u64,
    pub size: u32,
}

impl Record {
    fn parse(bytes: &[u8; RECORD_SIZE]) -> Record {
        Record {
            addr: u64::from_le_bytes(bytes[..8].try_into().unwrap()),
            size: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
        }
    }

    /// Blocks covered by this reference, lowest first. A zero-size access
    /// still touches the block under its address.
    pub fn blocks(&self, block_shift: u32) -> RangeInclusive<u64> {
        let first = self.addr >> block_shift;
        let last = self.addr.saturating_add(u64::from(self.size.max(1)) - 1) >> block_shift;
        first..=last
    }
}

/// An xz-compressed reference trace, decoded by a background thread into
/// batches on a bounded queue. The stream rewinds at EOF and keeps
/// producing; the driver's reference budget decides when the run ends.
pub struct Trace {
    pub rec: Receiver<Vec<Record>>,
    _thread: JoinHandle<()>,
}

impl Trace {
    pub fn read(
        path: PathBuf,
        records_per_batch: usize,
        batches_per_queue: usize,
    ) -> io::Result<Trace> {
        let stream = fs::File::open(path)?;
        let (sender, receiver) = crossbeam::channel::bounded(batches_per_queue);

        let t = thread::spawn(move || Trace::run_thread(stream, records_per_batch, sender));

        Ok(Trace {
            rec: receiver,
            _thread: t,
        })
    }

    fn run_thread(stream: fs::File, records_per_batch: usize, queue: Sender<Vec<Record>>) {
        let mut xz_stream = XzDecoder::new(stream);
        let mut bytes = vec![0u8; records_per_batch * RECORD_SIZE];
        loop {
            loop {
                let n = read_full(&mut xz_stream, &mut bytes);
                if n == 0 {
                    break;
                }
                assert_eq!(n % RECORD_SIZE, 0, "trace truncated mid-record");
                let batch: Vec<Record> = bytes[..n]
                    .chunks_exact(RECORD_SIZE)
                    .map(|chunk| Record::parse(chunk.try_into().unwrap()))
                    .collect();

                match queue.send(batch) {
                    Ok(()) => {}
                    Err(_) => return,
                }
            }

            let mut stream = xz_stream.into_inner();
            stream.seek(io::SeekFrom::Start(0)).unwrap();
            xz_stream = XzDecoder::new(stream);
        }
    }
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => panic!("trace read failed: {}", err),
        }
    }
    filled
}

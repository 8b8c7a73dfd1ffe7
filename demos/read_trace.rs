use std::error::Error;

use pkttrace::TraceHandle;

const DEFAULT_URI: &str = "pcapfile:/tmp/dump.pcap";

fn main() -> Result<(), Box<dyn Error>> {
  let args: Vec<String> = std::env::args().collect();
  let uri = args.get(1).map(String::as_str).unwrap_or(DEFAULT_URI);

  let mut handle = TraceHandle::open(uri)?;
  let mut cnt: u64 = 0;
  while let Some(packet) = handle.read_packet()? {
    cnt += 1;
    println!(
      "#{cnt} {} {} bytes at {:?}",
      packet.link_type, packet.capture_len, packet.timestamp
    );
  }
  println!("{}", handle.stats()?);
  handle.close();
  Ok(())
}

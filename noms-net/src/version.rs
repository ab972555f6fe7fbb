// Every chunk-protocol interaction carries this version; a counterpart
// running a different one is a hard error rather than something the
// core tries to negotiate down to.

use noms_base::{kind_err, Kind, Result};

pub const PROTOCOL_VERSION: u32 = 1;

pub fn check_version(peer_version: u32) -> Result<()> {
    if peer_version != PROTOCOL_VERSION {
        return Err(kind_err(
            Kind::Version,
            format!("peer speaks protocol version {peer_version}, we speak {PROTOCOL_VERSION}"),
        ));
    }
    Ok(())
}

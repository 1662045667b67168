//! Network utilities
//!
//! Provides network-related utility functions.

use std::net::SocketAddrV4;

/// Formats an endpoint as the `h1,h2,h3,h4,p1,p2` argument of PORT
pub fn format_port_argument(addr: SocketAddrV4) -> String {
    let [h1, h2, h3, h4] = addr.ip().octets();
    let port = addr.port();
    format!("{},{},{},{},{},{}", h1, h2, h3, h4, port >> 8, port & 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_port_argument() {
        let addr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(format_port_argument(addr), "127,0,0,1,19,136");

        let addr = "10.1.2.3:21".parse().unwrap();
        assert_eq!(format_port_argument(addr), "10,1,2,3,0,21");
    }
}

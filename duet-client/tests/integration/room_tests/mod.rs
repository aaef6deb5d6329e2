mod test_peers_discover_each_other;
mod test_third_peer_is_rejected;

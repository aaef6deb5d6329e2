mod test_dropping_handles_ends_call;
mod test_end_during_negotiation;
mod test_local_end_over_open_link;
mod test_peer_disconnect_ends_call;

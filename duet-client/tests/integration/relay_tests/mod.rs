mod test_call_over_websocket_relay;

mod test_webrtc_round_trip;

mod test_full_call_cycle;

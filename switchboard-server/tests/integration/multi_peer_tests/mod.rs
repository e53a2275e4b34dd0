mod test_session_setup;
mod test_sfu_negotiation;
mod test_three_peers_exchange;

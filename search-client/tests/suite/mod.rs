mod build_trigger;
mod http_gateway;
mod search_flow;

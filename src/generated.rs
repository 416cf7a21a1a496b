//! Protocol types generated from `proto/provider.proto` at build time.

tonic::include_proto!("folge.provider.v1");

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus server exposing the telemetry holding registers
//!
//! For avoiding confusion with the Modbus master/slave terminology, this module uses
//! the terms "server" and "client" instead. The server is the device that provides data,
//! while the client is the device that requests data.
//!
//! ## Supported Function Codes
//!
//! | Code | Request | Notes |
//! |------|---------|-------|
//! | 0x03 | Read Holding Registers | Whole block readable |
//! | 0x06 | Write Single Register | Used to select a file in `indexed_list` mode |
//! | 0x10 | Write Multiple Registers | |
//!
//! Any other function code answers `IllegalFunction`, any access outside the
//! block answers `IllegalDataAddress`.

use std::{future, io, net::SocketAddr};

use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio_modbus::{
    prelude::*,
    server::tcp::{accept_tcp_connection, Server},
};

use crate::utility::{RegisterBlock, RegisterError};

/// A Modbus TCP service backed by a shared [`RegisterBlock`].
///
/// One instance is created per client connection; all instances share the
/// same block, so a value written by one client is seen by every other client
/// and by the sync loop.
pub struct TelemetryModbusServer {
    registers: RegisterBlock,
}

impl tokio_modbus::server::Service for TelemetryModbusServer {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    /// Process a Modbus request and provide a response
    fn call(&self, req: Self::Request) -> Self::Future {
        debug!("Received Modbus request: {:?}", req);

        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => {
                debug!(
                    "Reading {} holding registers starting from address {}",
                    cnt, addr
                );
                self.registers
                    .read(addr, cnt)
                    .map(Response::ReadHoldingRegisters)
                    .map_err(illegal_data_address)
            }
            Request::WriteMultipleRegisters(addr, values) => {
                debug!(
                    "Writing {} values to holding registers starting from address {}",
                    values.len(),
                    addr
                );
                self.registers
                    .write(addr, &values)
                    .map(|_| Response::WriteMultipleRegisters(addr, values.len() as u16))
                    .map_err(illegal_data_address)
            }
            Request::WriteSingleRegister(addr, value) => {
                debug!("Writing value {} to holding register {}", value, addr);
                self.registers
                    .write(addr, std::slice::from_ref(&value))
                    .map(|_| Response::WriteSingleRegister(addr, value))
                    .map_err(illegal_data_address)
            }
            _ => {
                error!(
                    "Exception::IllegalFunction - Unimplemented function code in request: {req:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        };

        future::ready(res)
    }
}

impl TelemetryModbusServer {
    /// Create a service sharing `registers`
    pub fn new(registers: RegisterBlock) -> Self {
        Self { registers }
    }

    /// Current content of the whole register block
    pub fn holding_registers(&self) -> Vec<u16> {
        self.registers.snapshot()
    }
}

fn illegal_data_address(err: RegisterError) -> ExceptionCode {
    error!("Exception::IllegalDataAddress - {}", err);
    ExceptionCode::IllegalDataAddress
}

/// Serve `registers` to every client connecting on `listener`
///
/// Runs until the listener fails or the task is aborted.
pub async fn serve_registers(listener: TcpListener, registers: RegisterBlock) -> io::Result<()> {
    let server = Server::new(listener);

    let on_connected = move |stream, socket_addr: SocketAddr| {
        let registers = registers.clone();
        async move {
            accept_tcp_connection(stream, socket_addr, move |socket_addr| {
                info!("Modbus client connected from {}", socket_addr);
                Ok(Some(TelemetryModbusServer::new(registers.clone())))
            })
        }
    };

    let on_process_error = |err| {
        error!("Modbus server error: {err}");
    };

    server
        .serve(&on_connected, on_process_error)
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tokio_modbus::server::Service;

    #[tokio::test]
    async fn test_read_and_write_through_service() {
        let registers = RegisterBlock::new(10);
        registers.write(1, &[2350, 4520, 1]).unwrap();
        let service = TelemetryModbusServer::new(registers.clone());

        let response = service
            .call(Request::ReadHoldingRegisters(0, 4))
            .await
            .unwrap();
        assert_eq!(response, Response::ReadHoldingRegisters(vec![0, 2350, 4520, 1]));

        let response = service
            .call(Request::WriteSingleRegister(0, 3))
            .await
            .unwrap();
        assert_eq!(response, Response::WriteSingleRegister(0, 3));
        assert_eq!(registers.read(0, 1).unwrap(), vec![3]);

        let response = service
            .call(Request::WriteMultipleRegisters(7, Cow::Owned(vec![1, 2, 3])))
            .await
            .unwrap();
        assert_eq!(response, Response::WriteMultipleRegisters(7, 3));
        assert_eq!(service.holding_registers()[7..], [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_out_of_range_and_unsupported_requests() {
        let service = TelemetryModbusServer::new(RegisterBlock::new(10));

        let err = service
            .call(Request::ReadHoldingRegisters(5, 6))
            .await
            .unwrap_err();
        assert_eq!(err, ExceptionCode::IllegalDataAddress);

        let err = service
            .call(Request::WriteMultipleRegisters(1, Cow::Owned(vec![0; 10])))
            .await
            .unwrap_err();
        assert_eq!(err, ExceptionCode::IllegalDataAddress);

        let err = service
            .call(Request::ReadInputRegisters(0, 1))
            .await
            .unwrap_err();
        assert_eq!(err, ExceptionCode::IllegalFunction);
    }
}

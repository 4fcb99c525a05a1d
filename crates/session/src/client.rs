//! The base call surface.
//!
//! Every method is a thin wrapper that forwards its arguments, in order, to
//! [`RequestAdapter::invoke`]. Argument and result shapes belong to the remote
//! service; results are returned as the untouched `data` value.

use async_trait::async_trait;
use serde_json::Value;

use crate::{CallError, RequestAdapter};

/// Methods available on every session.
///
/// Implementors supply [`BaseClient::adapter`]; every other method has a
/// default body.
#[async_trait]
pub trait BaseClient: Send + Sync {
    /// The adapter every call goes through.
    fn adapter(&self) -> &RequestAdapter;

    /// Calls an arbitrary remote procedure.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.adapter().invoke(method, args).await
    }

    // -----------------------------------------------------------------------
    // Application
    // -----------------------------------------------------------------------

    /// Version string of the remote application.
    async fn get_app_version(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetAppVersion", params![]).await
    }

    /// Installation directory of the remote application.
    async fn get_app_path(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetAppPath", params![]).await
    }

    /// Path of the project currently loaded by the remote application.
    async fn get_project_path(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetProjectPath", params![]).await
    }

    // -----------------------------------------------------------------------
    // Communication
    // -----------------------------------------------------------------------

    /// Information about a communication port.
    async fn get_comm_port_info(&self, port: &str) -> Result<Value, CallError> {
        self.adapter().invoke("GetCommPortInfo", params![port]).await
    }

    /// Lists the communication ports the remote side can open.
    async fn enum_comm_ports(&self) -> Result<Value, CallError> {
        self.adapter().invoke("EnumCommPorts", params![]).await
    }

    /// Opens communication using a connection string such as
    /// `"RS232;port=COM3;speed=115200"`.
    async fn start_comm(&self, connection: &str) -> Result<Value, CallError> {
        self.adapter().invoke("StartComm", params![connection]).await
    }

    /// Closes communication.
    async fn stop_comm(&self) -> Result<Value, CallError> {
        self.adapter().invoke("StopComm", params![]).await
    }

    async fn is_comm_port_open(&self) -> Result<Value, CallError> {
        self.adapter().invoke("IsCommPortOpen", params![]).await
    }

    async fn is_board_detected(&self) -> Result<Value, CallError> {
        self.adapter().invoke("IsBoardDetected", params![]).await
    }

    /// Description of the connected target board.
    async fn get_detected_board_info(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetDetectedBoardInfo", params![]).await
    }

    // -----------------------------------------------------------------------
    // Project variables
    // -----------------------------------------------------------------------

    /// Reads a variable defined in the remote project.
    async fn read_variable(&self, name: &str) -> Result<Value, CallError> {
        self.adapter().invoke("ReadVariable", params![name]).await
    }

    /// Writes a variable defined in the remote project.
    async fn write_variable(&self, name: &str, value: Value) -> Result<Value, CallError> {
        self.adapter().invoke("WriteVariable", params![name, value]).await
    }

    /// Defines a project variable from a descriptor object.
    async fn define_variable(&self, definition: Value) -> Result<Value, CallError> {
        self.adapter().invoke("DefineVariable", params![definition]).await
    }

    async fn delete_variable(&self, name: &str) -> Result<Value, CallError> {
        self.adapter().invoke("DeleteVariable", params![name]).await
    }

    async fn get_variable_info(&self, name: &str) -> Result<Value, CallError> {
        self.adapter().invoke("GetVariableInfo", params![name]).await
    }

    // -----------------------------------------------------------------------
    // Raw memory
    //
    // `address` is anything the remote side can resolve: a number written as
    // a string, a symbol name, or an expression such as `"buffer+4"`.
    // -----------------------------------------------------------------------

    /// Reads `size` bytes starting at `address`.
    async fn read_memory(&self, address: &str, size: u32) -> Result<Value, CallError> {
        self.adapter().invoke("ReadMemory", params![address, size]).await
    }

    /// Writes `bytes` starting at `address`.
    async fn write_memory(&self, address: &str, bytes: &[u8]) -> Result<Value, CallError> {
        self.adapter().invoke("WriteMemory", params![address, bytes]).await
    }

    /// Reads an unsigned integer of `size` bytes (1, 2, 4 or 8).
    async fn read_uint_variable(&self, address: &str, size: u32) -> Result<Value, CallError> {
        self.adapter().invoke("ReadUIntVariable", params![address, size]).await
    }

    /// Reads a signed integer of `size` bytes (1, 2, 4 or 8).
    async fn read_int_variable(&self, address: &str, size: u32) -> Result<Value, CallError> {
        self.adapter().invoke("ReadIntVariable", params![address, size]).await
    }

    async fn read_float_variable(&self, address: &str) -> Result<Value, CallError> {
        self.adapter().invoke("ReadFloatVariable", params![address]).await
    }

    async fn read_double_variable(&self, address: &str) -> Result<Value, CallError> {
        self.adapter().invoke("ReadDoubleVariable", params![address]).await
    }

    async fn write_uint_variable(
        &self,
        address: &str,
        size: u32,
        value: u64,
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteUIntVariable", params![address, size, value])
            .await
    }

    async fn write_int_variable(
        &self,
        address: &str,
        size: u32,
        value: i64,
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteIntVariable", params![address, size, value])
            .await
    }

    async fn write_float_variable(&self, address: &str, value: f64) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteFloatVariable", params![address, value])
            .await
    }

    async fn write_double_variable(&self, address: &str, value: f64) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteDoubleVariable", params![address, value])
            .await
    }

    /// Reads `count` unsigned integers of `element_size` bytes each.
    async fn read_uint_array(
        &self,
        address: &str,
        count: u32,
        element_size: u32,
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("ReadUIntArray", params![address, count, element_size])
            .await
    }

    /// Reads `count` signed integers of `element_size` bytes each.
    async fn read_int_array(
        &self,
        address: &str,
        count: u32,
        element_size: u32,
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("ReadIntArray", params![address, count, element_size])
            .await
    }

    async fn read_float_array(&self, address: &str, count: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("ReadFloatArray", params![address, count])
            .await
    }

    async fn read_double_array(&self, address: &str, count: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("ReadDoubleArray", params![address, count])
            .await
    }

    async fn write_uint_array(
        &self,
        address: &str,
        element_size: u32,
        values: &[u64],
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteUIntArray", params![address, element_size, values])
            .await
    }

    async fn write_int_array(
        &self,
        address: &str,
        element_size: u32,
        values: &[i64],
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteIntArray", params![address, element_size, values])
            .await
    }

    async fn write_float_array(&self, address: &str, values: &[f64]) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteFloatArray", params![address, values])
            .await
    }

    async fn write_double_array(&self, address: &str, values: &[f64]) -> Result<Value, CallError> {
        self.adapter()
            .invoke("WriteDoubleArray", params![address, values])
            .await
    }

    // -----------------------------------------------------------------------
    // Symbols
    // -----------------------------------------------------------------------

    /// Address, size and type of a symbol from the loaded debug information.
    async fn get_symbol_info(&self, name: &str) -> Result<Value, CallError> {
        self.adapter().invoke("GetSymbolInfo", params![name]).await
    }

    async fn get_struct_size(&self, type_name: &str) -> Result<Value, CallError> {
        self.adapter().invoke("GetStructSize", params![type_name]).await
    }

    /// Resolves an address expression to a numeric address and size.
    async fn get_address_info(&self, address: &str) -> Result<Value, CallError> {
        self.adapter().invoke("GetAddressInfo", params![address]).await
    }

    // -----------------------------------------------------------------------
    // Pipes
    // -----------------------------------------------------------------------

    /// Opens pipe `port` with the given transmit and receive buffer sizes.
    async fn pipe_open(&self, port: u32, tx_size: u32, rx_size: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("PipeOpen", params![port, tx_size, rx_size])
            .await
    }

    async fn pipe_close(&self, port: u32) -> Result<Value, CallError> {
        self.adapter().invoke("PipeClose", params![port]).await
    }

    async fn pipe_flush(&self, port: u32) -> Result<Value, CallError> {
        self.adapter().invoke("PipeFlush", params![port]).await
    }

    async fn pipe_send_string(&self, port: u32, text: &str) -> Result<Value, CallError> {
        self.adapter()
            .invoke("PipeSendString", params![port, text])
            .await
    }

    /// Receives at most `max_len` characters from pipe `port`.
    async fn pipe_receive_string(&self, port: u32, max_len: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("PipeReceiveString", params![port, max_len])
            .await
    }

    async fn pipe_send_uint_array(
        &self,
        port: u32,
        element_size: u32,
        values: &[u64],
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke("PipeSendUIntArray", params![port, element_size, values])
            .await
    }

    async fn pipe_receive_uint_array(
        &self,
        port: u32,
        element_size: u32,
        max_count: u32,
    ) -> Result<Value, CallError> {
        self.adapter()
            .invoke(
                "PipeReceiveUIntArray",
                params![port, element_size, max_count],
            )
            .await
    }

    // -----------------------------------------------------------------------
    // Recorder and oscilloscope
    // -----------------------------------------------------------------------

    /// Configures recorder `recorder` from a setup object (variables, trigger,
    /// sample count). The shape of `setup` is defined by the remote service.
    async fn setup_recorder(&self, recorder: u32, setup: Value) -> Result<Value, CallError> {
        self.adapter()
            .invoke("SetupRecorder", params![recorder, setup])
            .await
    }

    async fn start_recorder(&self, recorder: u32) -> Result<Value, CallError> {
        self.adapter().invoke("StartRecorder", params![recorder]).await
    }

    async fn stop_recorder(&self, recorder: u32) -> Result<Value, CallError> {
        self.adapter().invoke("StopRecorder", params![recorder]).await
    }

    async fn get_recorder_status(&self, recorder: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("GetRecorderStatus", params![recorder])
            .await
    }

    /// Sampled data of a finished recorder run.
    async fn get_recorder_data(&self, recorder: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("GetRecorderData", params![recorder])
            .await
    }

    async fn setup_oscilloscope(&self, scope: u32, setup: Value) -> Result<Value, CallError> {
        self.adapter()
            .invoke("SetupOscilloscope", params![scope, setup])
            .await
    }

    async fn get_oscilloscope_data(&self, scope: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("GetOscilloscopeData", params![scope])
            .await
    }
}
